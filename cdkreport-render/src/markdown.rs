use crate::text::kind_label;
use cdkreport_types::changeset::{ChangeAction, ChangesetResult, ChangesetStatus, ResourceChange};
use cdkreport_types::report::StackFailure;
use serde_json::Value;

/// Logical ids longer than this are shortened in markdown tables.
const MAX_LOGICAL_ID_LEN: usize = 50;
const ELLIPSIS: &str = "(...)";

const HEADINGS: [&str; 6] = [
    "Action",
    "Requires Recreation",
    "Resource Type",
    "Logical Resource Id",
    "Change Target",
    "Change Reason",
];

/// Collapsible GitHub markdown block for one stack, suitable for a PR comment.
pub fn render_markdown(result: &ChangesetResult) -> String {
    let stack = &result.stack_name;
    let mut out = String::new();
    out.push_str("\n<details>\n");

    match result.status {
        ChangesetStatus::NotFound => {
            out.push_str(&format!(
                "<summary>Changeset for stack <strong>{stack}</strong> (not found)</summary>\n\n"
            ));
            out.push_str(&format!(
                "_No changeset named `{}`._\n",
                result.changeset_name
            ));
        }
        ChangesetStatus::Failed => {
            out.push_str(&format!(
                "<summary>Changeset for stack <strong>{stack}</strong> (failed)</summary>\n\n"
            ));
            out.push_str(&format!(
                "{}\n",
                result.status_reason.as_deref().unwrap_or("No reason given.")
            ));
        }
        ChangesetStatus::Pending | ChangesetStatus::Available => {
            let mut suffix = String::new();
            if result.status == ChangesetStatus::Pending {
                suffix.push_str(" (pending)");
            }
            if result.requires_recreation() {
                suffix.push_str(" (🚨 resources requires recreation 🚨)");
            }
            out.push_str(&format!(
                "<summary>Changeset for stack <strong>{stack}</strong>{suffix}</summary>\n\n"
            ));
            out.push_str(&table(&result.changes));
        }
    }

    out.push_str("\n</details>\n");
    out
}

/// Markdown list of stacks that could not be reported.
pub fn render_failures_md(failures: &[StackFailure]) -> String {
    let mut out = String::new();
    out.push_str("\n**Stacks that could not be reported**\n\n");
    for f in failures {
        out.push_str(&format!(
            "- `{}` ({}): {}\n",
            f.stack_name,
            kind_label(f.kind),
            escape_cell(&f.message)
        ));
    }
    out
}

/// Shorten `text` to `max_len` characters by cutting out its middle.
///
/// The start and end of CDK logical ids carry the construct path and hash, so
/// both are kept.
pub fn truncate_middle(text: &str, max_len: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len()) / 2;
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{head}{ELLIPSIS}{tail}")
}

fn table(changes: &[ResourceChange]) -> String {
    let mut rows: Vec<(ChangeAction, [String; 6])> = changes.iter().map(row).collect();
    rows.sort_by_key(|(action, _)| *action);

    let mut out = String::new();
    out.push_str(&format!("| {} |\n", HEADINGS.join(" | ")));
    out.push_str(&format!("|{}\n", " --- |".repeat(HEADINGS.len())));
    for (_, cells) in &rows {
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    if rows.is_empty() {
        out.push_str("\n_No resource changes._\n");
    }
    out
}

fn row(change: &ResourceChange) -> (ChangeAction, [String; 6]) {
    let first = change.detail_entries().first();
    let target = first
        .and_then(|d| d.pointer("/Target/Name"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let reason = first
        .and_then(|d| d.get("ChangeSource"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    let recreation = match change.requires_recreation() {
        Some(level @ ("Always" | "Conditionally")) => {
            format!("### $\\textcolor{{red}}{{\\textsf{{{level}}}}}$")
        }
        Some(level) => level.to_string(),
        None => "No".to_string(),
    };

    let cells = [
        action_label(change.action).to_string(),
        recreation,
        escape_cell(&change.resource_type),
        escape_cell(&truncate_middle(&change.logical_id, MAX_LOGICAL_ID_LEN)),
        escape_cell(target),
        escape_cell(reason),
    ];
    (change.action, cells)
}

fn action_label(action: ChangeAction) -> &'static str {
    match action {
        ChangeAction::Add => "Add",
        ChangeAction::Dynamic => "Dynamic",
        ChangeAction::Import => "Import",
        ChangeAction::Modify => "Modify",
        ChangeAction::Remove => "Remove",
    }
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
