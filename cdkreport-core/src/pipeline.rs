//! Report pipeline, extracted from the CLI.
//!
//! Selection is synchronous and touches only the filesystem; fetching goes
//! through the port traits so it can run against fakes.

use crate::fetch::ChangesetFetcher;
use crate::selector::StackSelection;
use crate::settings::ReportSettings;
use cdkreport_assembly::AssemblyError;
use cdkreport_types::report::{ReportRun, ToolInfo};
use cdkreport_types::stack::StackDescriptor;
use tracing::{debug, info, warn};

/// Exit code when every selected stack was reported.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code when a stack failed or the selection matched nothing.
pub const EXIT_STACK_FAILURE: u8 = 1;
/// Exit code for invalid arguments, configuration, or assembly load failures.
pub const EXIT_USAGE: u8 = 2;

/// Errors that stop a run before any stack is fetched.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("no stacks matched {criteria} ({available} stack(s) in assembly)")]
    EmptySelection { criteria: String, available: usize },
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Assembly(_) => EXIT_USAGE,
            ToolError::EmptySelection { .. } => EXIT_STACK_FAILURE,
        }
    }
}

/// Load the assembly and apply the selection.
///
/// An empty selection is reported as [`ToolError::EmptySelection`] so callers
/// can tell it apart from a stack whose changeset has no changes.
pub fn select_stacks(settings: &ReportSettings) -> Result<Vec<StackDescriptor>, ToolError> {
    let all = cdkreport_assembly::load(&settings.assembly_dir)?;
    let selected = settings.selection.select(&all);

    debug!(
        available = all.len(),
        selected = selected.len(),
        "applied stack selection"
    );

    if selected.is_empty() {
        return Err(ToolError::EmptySelection {
            criteria: describe_selection(&settings.selection),
            available: all.len(),
        });
    }
    Ok(selected)
}

fn describe_selection(selection: &StackSelection) -> String {
    if selection.is_empty() {
        return "no criteria".to_string();
    }
    let patterns: Vec<String> = selection
        .criteria()
        .iter()
        .map(|c| format!("'{c}'"))
        .collect();
    patterns.join(", ")
}

/// Fetch every stack's changeset in order, recording failures as they happen.
pub async fn gather(
    fetcher: &ChangesetFetcher<'_>,
    stacks: &[StackDescriptor],
    changeset_name: &str,
    tool: ToolInfo,
) -> ReportRun {
    let mut run = ReportRun::new(tool, changeset_name);

    for stack in stacks {
        info!(stack = %stack.name, changeset = changeset_name, "fetching changeset");
        match fetcher.fetch(stack, changeset_name).await {
            Ok(result) => run.results.push(result),
            Err(err) => {
                warn!(stack = %stack.name, error = %err, "stack failed");
                run.failures.push(err.to_failure());
            }
        }
    }

    run
}

/// Exit code for a completed run.
pub fn exit_code(run: &ReportRun) -> u8 {
    if run.has_failures() {
        EXIT_STACK_FAILURE
    } else {
        EXIT_SUCCESS
    }
}
