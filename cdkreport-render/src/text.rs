use cdkreport_types::changeset::{ChangesetResult, ChangesetStatus};
use cdkreport_types::report::{FailureKind, StackFailure};

/// Plain-text rendering of one stack's changeset.
///
/// One header line, then one line per change in the order received.
pub fn format_result(result: &ChangesetResult) -> String {
    let mut out = String::new();
    let stack = &result.stack_name;
    let name = &result.changeset_name;

    match result.status {
        ChangesetStatus::NotFound => {
            out.push_str(&format!(
                "Stack {stack}: changeset '{name}' not found\n"
            ));
            return out;
        }
        ChangesetStatus::Failed => {
            let reason = result
                .status_reason
                .as_deref()
                .unwrap_or("no reason given");
            out.push_str(&format!(
                "Stack {stack}: changeset '{name}' failed: {reason}\n"
            ));
            return out;
        }
        ChangesetStatus::Pending => {
            out.push_str(&format!(
                "Stack {stack}: changeset '{name}' (pending, changes may be incomplete)\n"
            ));
        }
        ChangesetStatus::Available => {
            out.push_str(&format!("Stack {stack}: changeset '{name}'\n"));
        }
    }

    if result.changes.is_empty() {
        out.push_str("  no resource changes\n");
        return out;
    }

    for change in &result.changes {
        out.push_str(&format!(
            "  {:<8} {} ({})",
            change.action.as_str(),
            change.logical_id,
            change.resource_type
        ));
        if change.recreates() {
            if let Some(level) = change.requires_recreation() {
                out.push_str(&format!(" [recreation: {level}]"));
            }
        }
        out.push('\n');
    }

    out
}

pub fn format_failure(failure: &StackFailure) -> String {
    format!(
        "  {} [{}]: {}\n",
        failure.stack_name,
        kind_label(failure.kind),
        failure.message
    )
}

pub(crate) fn kind_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::RoleAssumption => "role assumption",
        FailureKind::ChangesetFetch => "changeset fetch",
    }
}
