use crate::changeset::ChangesetResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RoleAssumption,
    ChangesetFetch,
}

/// A stack whose changeset could not be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFailure {
    pub stack_name: String,
    pub kind: FailureKind,
    pub message: String,

    /// Number of provider calls made before giving up.
    #[serde(default)]
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Everything one invocation produced, in selection order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRun {
    pub schema: String,
    pub tool: ToolInfo,
    pub generated_at: DateTime<Utc>,
    pub changeset_name: String,

    #[serde(default)]
    pub results: Vec<ChangesetResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StackFailure>,
}

impl ReportRun {
    pub fn new(tool: ToolInfo, changeset_name: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::CDKREPORT_RUN_V1.to_string(),
            tool,
            generated_at: Utc::now(),
            changeset_name: changeset_name.into(),
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
