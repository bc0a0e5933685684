//! Clap-free settings for the report pipeline.

use crate::retry::RetryPolicy;
use crate::selector::StackSelection;
use camino::Utf8PathBuf;

pub const DEFAULT_ASSEMBLY_DIR: &str = "cdk.out";

/// Settings for one report run.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub assembly_dir: Utf8PathBuf,
    pub changeset_name: String,
    pub selection: StackSelection,
    pub retry: RetryPolicy,
}

impl ReportSettings {
    pub fn new(changeset_name: impl Into<String>) -> Self {
        Self {
            assembly_dir: Utf8PathBuf::from(DEFAULT_ASSEMBLY_DIR),
            changeset_name: changeset_name.into(),
            selection: StackSelection::match_all(),
            retry: RetryPolicy::default(),
        }
    }
}
