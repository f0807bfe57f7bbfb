//! Work item snapshots and the raw records they are hydrated from.

use super::{BranchRef, IdentityRef, WorkItemFields, WorkItemId};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Relation attribute name identifying a linked branch.
pub const BRANCH_RELATION_NAME: &str = "Branch";

/// Relation type used for artifact links such as branches.
pub const ARTIFACT_LINK_RELATION: &str = "ArtifactLink";

/// Inline-encodable avatar image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvatarBlob {
    media_type: String,
    base64_data: String,
}

impl AvatarBlob {
    /// Creates a blob from data that is already base64 encoded.
    #[must_use]
    pub fn from_base64(media_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            base64_data: base64_data.into(),
        }
    }

    /// Creates a blob by encoding raw image bytes.
    #[must_use]
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            base64_data: STANDARD.encode(bytes),
        }
    }

    /// Returns the image media type.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns the base64 payload.
    #[must_use]
    pub fn base64_data(&self) -> &str {
        &self.base64_data
    }

    /// Renders the blob as a `data:` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64_data)
    }
}

/// Person a work item is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    display_name: String,
    unique_name: String,
    avatar: Option<AvatarBlob>,
}

impl Assignee {
    /// Creates an assignee without an avatar.
    #[must_use]
    pub fn new(display_name: impl Into<String>, unique_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            unique_name: unique_name.into(),
            avatar: None,
        }
    }

    /// Attaches an avatar.
    #[must_use]
    pub fn with_avatar(mut self, avatar: Option<AvatarBlob>) -> Self {
        self.avatar = avatar;
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the unique sign-in name.
    #[must_use]
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Returns the avatar, if one was resolved.
    #[must_use]
    pub const fn avatar(&self) -> Option<&AvatarBlob> {
        self.avatar.as_ref()
    }
}

impl From<&IdentityRef> for Assignee {
    fn from(identity: &IdentityRef) -> Self {
        Self::new(identity.display_name.clone(), identity.unique_name.clone())
    }
}

/// Attributes carried by a work item relation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelationAttributes {
    /// Relation display name, `Branch` for linked branches.
    #[serde(default)]
    pub name: Option<String>,
}

/// Relation between a work item and another item or artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemRelation {
    /// Relation type, for example `ArtifactLink`.
    pub rel: String,
    /// Target URL.
    pub url: String,
    /// Relation attributes.
    #[serde(default)]
    pub attributes: RelationAttributes,
}

impl WorkItemRelation {
    /// Builds the artifact relation that links a branch to an item.
    #[must_use]
    pub fn branch_link(url: impl Into<String>) -> Self {
        Self {
            rel: ARTIFACT_LINK_RELATION.to_owned(),
            url: url.into(),
            attributes: RelationAttributes {
                name: Some(BRANCH_RELATION_NAME.to_owned()),
            },
        }
    }

    /// Returns true when this relation links a branch.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        self.attributes.name.as_deref() == Some(BRANCH_RELATION_NAME)
    }
}

/// Work item record as fetched from the remote store, before hydration.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteWorkItem {
    /// Item identifier.
    pub id: WorkItemId,
    /// Typed fields.
    pub fields: WorkItemFields,
    /// Relations in remote enumeration order.
    pub relations: Vec<WorkItemRelation>,
    /// Web URL for editing the item.
    pub web_url: Option<String>,
}

impl RemoteWorkItem {
    /// Returns the first branch relation, if any.
    #[must_use]
    pub fn first_branch_relation(&self) -> Option<&WorkItemRelation> {
        self.relations.iter().find(|relation| relation.is_branch())
    }
}

/// Immutable, fully hydrated work item snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    id: WorkItemId,
    work_item_type: String,
    title: String,
    description: Option<String>,
    acceptance_criteria: Option<String>,
    state: String,
    reason: Option<String>,
    assignee: Option<Assignee>,
    story_points: Option<f64>,
    parent: Option<WorkItemId>,
    branch: Option<BranchRef>,
    web_url: Option<String>,
}

impl WorkItem {
    /// Builds a snapshot from a remote record and its resolved extras.
    #[must_use]
    pub fn from_remote(
        remote: RemoteWorkItem,
        assignee: Option<Assignee>,
        branch: Option<BranchRef>,
    ) -> Self {
        let fields = remote.fields;
        Self {
            id: remote.id,
            work_item_type: fields.work_item_type,
            title: fields.title,
            description: fields.description,
            acceptance_criteria: fields.acceptance_criteria,
            state: fields.state,
            reason: fields.reason,
            assignee,
            story_points: fields.story_points,
            parent: fields.parent,
            branch,
            web_url: remote.web_url,
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub const fn id(&self) -> WorkItemId {
        self.id
    }

    /// Returns the item type tag, for example `Bug`.
    #[must_use]
    pub fn work_item_type(&self) -> &str {
        &self.work_item_type
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the rich-text description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the rich-text acceptance criteria.
    #[must_use]
    pub fn acceptance_criteria(&self) -> Option<&str> {
        self.acceptance_criteria.as_deref()
    }

    /// Returns the workflow state.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the reason for the current state.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assignee(&self) -> Option<&Assignee> {
        self.assignee.as_ref()
    }

    /// Returns the story points estimate.
    #[must_use]
    pub const fn story_points(&self) -> Option<f64> {
        self.story_points
    }

    /// Returns the parent identifier; `None` means a root item.
    #[must_use]
    pub const fn parent(&self) -> Option<WorkItemId> {
        self.parent
    }

    /// Returns the linked branch.
    #[must_use]
    pub const fn branch(&self) -> Option<&BranchRef> {
        self.branch.as_ref()
    }

    /// Returns the web edit URL.
    #[must_use]
    pub fn web_url(&self) -> Option<&str> {
        self.web_url.as_deref()
    }

    /// Returns the glyph shown before the item in lists.
    #[must_use]
    pub fn state_glyph(&self) -> &'static str {
        match self.state.as_str() {
            "Closed" => "\u{2705}",
            "New" => "\u{1f533}",
            "Resolved" => "\u{1f7e7}",
            _ => "\u{1f7e6}",
        }
    }

    /// Returns the assignee's display name or `Unassigned`.
    #[must_use]
    pub fn assignee_label(&self) -> &str {
        self.assignee
            .as_ref()
            .map_or("Unassigned", Assignee::display_name)
    }
}
