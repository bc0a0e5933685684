use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangesetStatus {
    Pending,
    Available,
    Failed,
    NotFound,
}

impl ChangesetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangesetStatus::Pending => "pending",
            ChangesetStatus::Available => "available",
            ChangesetStatus::Failed => "failed",
            ChangesetStatus::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ChangesetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What CloudFormation will do to a resource.
///
/// Ordering follows declaration order and is used to group markdown rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Add,
    Dynamic,
    Import,
    Modify,
    Remove,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeAction::Add => "add",
            ChangeAction::Dynamic => "dynamic",
            ChangeAction::Import => "import",
            ChangeAction::Modify => "modify",
            ChangeAction::Remove => "remove",
        }
    }

    /// Parse the provider's action string (`Add`, `Modify`, ...), case-insensitively.
    pub fn from_provider(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "add" => Some(ChangeAction::Add),
            "dynamic" => Some(ChangeAction::Dynamic),
            "import" => Some(ChangeAction::Import),
            "modify" => Some(ChangeAction::Modify),
            "remove" => Some(ChangeAction::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed resource change.
///
/// `details` mirrors the provider's change description (`PhysicalResourceId`,
/// `Replacement`, `Scope`, `Details`) without any reshaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub logical_id: String,
    pub resource_type: String,
    pub action: ChangeAction,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl ResourceChange {
    pub fn new(
        action: ChangeAction,
        logical_id: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            logical_id: logical_id.into(),
            resource_type: resource_type.into(),
            action,
            details: Map::new(),
        }
    }

    /// Per-attribute change details (`details.Details`), empty when absent.
    pub fn detail_entries(&self) -> &[Value] {
        self.details
            .get("Details")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Strongest `RequiresRecreation` across all detail entries.
    ///
    /// Returns `None` when the provider sent no details.
    pub fn requires_recreation(&self) -> Option<&str> {
        let mut strongest: Option<&str> = None;
        for entry in self.detail_entries() {
            let Some(value) = entry
                .pointer("/Target/RequiresRecreation")
                .and_then(Value::as_str)
            else {
                continue;
            };
            strongest = match (strongest, value) {
                (_, "Always") => Some("Always"),
                (Some("Always"), _) => strongest,
                (_, "Conditionally") => Some("Conditionally"),
                (None, other) => Some(other),
                (current, _) => current,
            };
        }
        strongest
    }

    pub fn recreates(&self) -> bool {
        matches!(
            self.requires_recreation(),
            Some("Always") | Some("Conditionally")
        )
    }
}

/// Outcome of querying one stack's changeset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesetResult {
    pub stack_name: String,
    pub changeset_name: String,
    pub status: ChangesetStatus,

    /// Provider explanation, set for failed changesets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_status: Option<String>,

    /// Changes in the order the provider returned them.
    #[serde(default)]
    pub changes: Vec<ResourceChange>,
}

impl ChangesetResult {
    pub fn not_found(stack_name: impl Into<String>, changeset_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            changeset_name: changeset_name.into(),
            status: ChangesetStatus::NotFound,
            status_reason: None,
            execution_status: None,
            changes: Vec::new(),
        }
    }

    pub fn requires_recreation(&self) -> bool {
        self.changes.iter().any(ResourceChange::recreates)
    }
}
