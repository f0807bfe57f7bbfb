//! Wire models for the Azure DevOps REST API.

use crate::work_item::{
    domain::{BranchStats, RemoteWorkItem, WorkItemFields, WorkItemId, WorkItemRelation},
    ports::{RefUpdate, RefUpdateOutcome},
};
use serde::{Deserialize, Serialize};

/// Envelope used by list endpoints.
#[derive(Debug, Deserialize)]
pub(super) struct ValueList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WorkItemRow {
    pub id: WorkItemId,
    #[serde(default)]
    pub fields: WorkItemFields,
    #[serde(default)]
    pub relations: Option<Vec<WorkItemRelation>>,
    #[serde(rename = "_links", default)]
    pub links: Option<WorkItemLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct WorkItemLinks {
    #[serde(default)]
    pub html: Option<Href>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Href {
    pub href: String,
}

impl From<WorkItemRow> for RemoteWorkItem {
    fn from(row: WorkItemRow) -> Self {
        Self {
            id: row.id,
            fields: row.fields,
            relations: row.relations.unwrap_or_default(),
            web_url: row.links.and_then(|links| links.html).map(|html| html.href),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AvatarPayload {
    pub image_type: String,
    pub image_data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BranchStatsRow {
    pub name: String,
    #[serde(default)]
    pub ahead_count: u32,
    #[serde(default)]
    pub behind_count: u32,
    #[serde(default)]
    pub commit: Option<CommitRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CommitRow {
    pub commit_id: String,
}

impl From<BranchStatsRow> for BranchStats {
    fn from(row: BranchStatsRow) -> Self {
        Self {
            name: row.name,
            ahead_count: row.ahead_count,
            behind_count: row.behind_count,
            commit_id: row.commit.map(|commit| commit.commit_id),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefUpdateRow<'a> {
    pub name: &'a str,
    pub new_object_id: &'a str,
    pub old_object_id: &'a str,
}

impl<'a> From<&'a RefUpdate> for RefUpdateRow<'a> {
    fn from(update: &'a RefUpdate) -> Self {
        Self {
            name: &update.name,
            new_object_id: &update.new_object_id,
            old_object_id: &update.old_object_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefUpdateResultRow {
    pub name: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub update_status: String,
}

impl From<RefUpdateResultRow> for RefUpdateOutcome {
    fn from(row: RefUpdateResultRow) -> Self {
        Self {
            name: row.name,
            success: row.success,
            status: row.update_status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedWorkItemRow {
    pub id: WorkItemId,
}
