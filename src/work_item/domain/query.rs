//! Saved queries and normalisation of their result shapes.

use super::{QueryId, WorkItemId};
use serde::{Deserialize, Serialize};

/// Saved query configured for the board view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Remote query identifier.
    pub id: QueryId,
    /// Display name shown as the top-level node.
    pub name: String,
}

impl Query {
    /// Creates a query descriptor.
    #[must_use]
    pub fn new(id: QueryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Reference to a work item inside a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemReference {
    /// Referenced item.
    pub id: WorkItemId,
}

/// Relation edge inside a hierarchical query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemLinkEdge {
    /// Link type, absent for root rows.
    #[serde(default)]
    pub rel: Option<String>,
    /// Parent side of the edge, absent for root rows.
    #[serde(default)]
    pub source: Option<WorkItemReference>,
    /// Item the row is about.
    #[serde(default)]
    pub target: Option<WorkItemReference>,
}

/// Raw result of running a saved query.
///
/// Flat queries fill `work_items`; tree and one-hop queries fill
/// `work_item_relations`. The relation data is discarded: the hierarchy is
/// rebuilt from each item's parent field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Flat result rows.
    #[serde(default)]
    pub work_items: Option<Vec<WorkItemReference>>,
    /// Hierarchical result rows.
    #[serde(default)]
    pub work_item_relations: Option<Vec<WorkItemLinkEdge>>,
}

impl QueryResult {
    /// Creates a flat result.
    #[must_use]
    pub fn flat(ids: impl IntoIterator<Item = WorkItemId>) -> Self {
        Self {
            work_items: Some(ids.into_iter().map(|id| WorkItemReference { id }).collect()),
            work_item_relations: None,
        }
    }

    /// Creates a hierarchical result from `(source, target)` rows.
    #[must_use]
    pub fn hierarchical(
        rows: impl IntoIterator<Item = (Option<WorkItemId>, WorkItemId)>,
    ) -> Self {
        let edges = rows
            .into_iter()
            .map(|(source, target)| WorkItemLinkEdge {
                rel: source.map(|_| "System.LinkTypes.Hierarchy-Forward".to_owned()),
                source: source.map(|id| WorkItemReference { id }),
                target: Some(WorkItemReference { id: target }),
            })
            .collect();
        Self {
            work_items: None,
            work_item_relations: Some(edges),
        }
    }

    /// Projects the result onto an ordered id list.
    ///
    /// Hierarchical rows win when both shapes are present. Rows without a
    /// target are skipped.
    #[must_use]
    pub fn into_ids(self) -> Vec<WorkItemId> {
        if let Some(relations) = self.work_item_relations {
            return relations
                .into_iter()
                .filter_map(|edge| edge.target.map(|target| target.id))
                .collect();
        }
        self.work_items
            .unwrap_or_default()
            .into_iter()
            .map(|reference| reference.id)
            .collect()
    }
}
