//! JSON-patch documents for remote work item mutations.

use super::{WorkItemField, WorkItemRelation};
use pulldown_cmark::{Parser, html};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path appending to an item's relation list.
pub const RELATIONS_APPEND_PATH: &str = "/relations/-";

/// Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// Adds a value (or appends with `-`).
    Add,
    /// Replaces an existing value.
    Replace,
}

/// One JSON-patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Operation kind.
    pub op: PatchOp,
    /// Target path, for example `/fields/System.State`.
    pub path: String,
    /// Value written at the path.
    pub value: Value,
}

impl PatchOperation {
    /// Replaces a field value.
    #[must_use]
    pub fn replace_field(field: WorkItemField, value: impl Into<Value>) -> Self {
        Self {
            op: PatchOp::Replace,
            path: field.patch_path(),
            value: value.into(),
        }
    }

    /// Adds a field value, used when creating items.
    #[must_use]
    pub fn add_field(field: WorkItemField, value: impl Into<Value>) -> Self {
        Self {
            op: PatchOp::Add,
            path: field.patch_path(),
            value: value.into(),
        }
    }

    /// Appends a relation.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the relation cannot be encoded.
    pub fn add_relation(relation: &WorkItemRelation) -> Result<Self, serde_json::Error> {
        Ok(Self {
            op: PatchOp::Add,
            path: RELATIONS_APPEND_PATH.to_owned(),
            value: serde_json::to_value(relation)?,
        })
    }
}

/// Ordered list of patch operations submitted as one request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPatch(Vec<PatchOperation>);

impl JsonPatch {
    /// Creates an empty patch.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an operation.
    #[must_use]
    pub fn with(mut self, operation: PatchOperation) -> Self {
        self.0.push(operation);
        self
    }

    /// Returns the operations in submission order.
    #[must_use]
    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    /// Returns the value written to `field`, if this patch writes it.
    #[must_use]
    pub fn value_for(&self, field: WorkItemField) -> Option<&Value> {
        let path = field.patch_path();
        self.0
            .iter()
            .find(|operation| operation.path == path)
            .map(|operation| &operation.value)
    }
}

/// Renders Markdown to the HTML stored in rich-text fields.
#[must_use]
pub fn render_rich_text(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut rendered = String::with_capacity(markdown.len());
    html::push_html(&mut rendered, parser);
    rendered
}
