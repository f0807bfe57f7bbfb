//! Static schema for the remote work item fields this crate reads and writes.
//!
//! Remote items carry an open-ended map of fields keyed by reference name.
//! [`WorkItemField`] names the subset the crate understands and
//! [`WorkItemFields`] deserializes that subset into typed values at the
//! hydration boundary, so no code downstream indexes the map by string.

use super::WorkItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known remote work item fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkItemField {
    /// `System.Id`.
    Id,
    /// `System.WorkItemType`.
    WorkItemType,
    /// `System.Title`.
    Title,
    /// `System.Description`.
    Description,
    /// `Microsoft.VSTS.Common.AcceptanceCriteria`.
    AcceptanceCriteria,
    /// `System.State`.
    State,
    /// `System.Reason`.
    Reason,
    /// `System.AssignedTo`.
    AssignedTo,
    /// `Microsoft.VSTS.Scheduling.StoryPoints`.
    StoryPoints,
    /// `System.Parent`.
    Parent,
}

impl WorkItemField {
    /// Every known field, in schema order.
    pub const ALL: [Self; 10] = [
        Self::Id,
        Self::WorkItemType,
        Self::Title,
        Self::Description,
        Self::AcceptanceCriteria,
        Self::State,
        Self::Reason,
        Self::AssignedTo,
        Self::StoryPoints,
        Self::Parent,
    ];

    /// Returns the remote reference name.
    #[must_use]
    pub const fn reference_name(self) -> &'static str {
        match self {
            Self::Id => "System.Id",
            Self::WorkItemType => "System.WorkItemType",
            Self::Title => "System.Title",
            Self::Description => "System.Description",
            Self::AcceptanceCriteria => "Microsoft.VSTS.Common.AcceptanceCriteria",
            Self::State => "System.State",
            Self::Reason => "System.Reason",
            Self::AssignedTo => "System.AssignedTo",
            Self::StoryPoints => "Microsoft.VSTS.Scheduling.StoryPoints",
            Self::Parent => "System.Parent",
        }
    }

    /// Returns the JSON-patch path addressing this field.
    #[must_use]
    pub fn patch_path(self) -> String {
        format!("/fields/{}", self.reference_name())
    }

    /// Returns true when values for this field are authored as Markdown and
    /// stored remotely as HTML.
    #[must_use]
    pub const fn is_rich_text(self) -> bool {
        matches!(self, Self::Description | Self::AcceptanceCriteria)
    }
}

impl TryFrom<&str> for WorkItemField {
    type Error = UnknownWorkItemField;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.reference_name() == trimmed)
            .ok_or_else(|| UnknownWorkItemField(value.to_owned()))
    }
}

impl fmt::Display for WorkItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reference_name())
    }
}

/// Error returned when a field reference name is outside the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown work item field: {0}")]
pub struct UnknownWorkItemField(pub String);

/// Identity reference as returned in `System.AssignedTo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    /// Human-readable display name.
    #[serde(default)]
    pub display_name: String,
    /// Unique sign-in name; used as the avatar cache key.
    #[serde(default)]
    pub unique_name: String,
    /// Authenticated avatar endpoint.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Typed view over the known subset of a remote item's fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkItemFields {
    /// `System.Id`.
    #[serde(rename = "System.Id", default)]
    pub id: Option<WorkItemId>,
    /// `System.WorkItemType`.
    #[serde(rename = "System.WorkItemType", default)]
    pub work_item_type: String,
    /// `System.Title`.
    #[serde(rename = "System.Title", default)]
    pub title: String,
    /// `System.Description`.
    #[serde(rename = "System.Description", default)]
    pub description: Option<String>,
    /// `Microsoft.VSTS.Common.AcceptanceCriteria`.
    #[serde(rename = "Microsoft.VSTS.Common.AcceptanceCriteria", default)]
    pub acceptance_criteria: Option<String>,
    /// `System.State`.
    #[serde(rename = "System.State", default)]
    pub state: String,
    /// `System.Reason`.
    #[serde(rename = "System.Reason", default)]
    pub reason: Option<String>,
    /// `System.AssignedTo`.
    #[serde(rename = "System.AssignedTo", default)]
    pub assigned_to: Option<IdentityRef>,
    /// `Microsoft.VSTS.Scheduling.StoryPoints`.
    #[serde(rename = "Microsoft.VSTS.Scheduling.StoryPoints", default)]
    pub story_points: Option<f64>,
    /// `System.Parent`.
    #[serde(rename = "System.Parent", default)]
    pub parent: Option<WorkItemId>,
}
