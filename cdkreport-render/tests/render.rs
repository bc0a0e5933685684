use cdkreport_render::{
    OutputFormat, format_failure, format_result, render_json, render_markdown, render_yaml,
    write_report,
};
use cdkreport_types::changeset::{ChangeAction, ChangesetResult, ChangesetStatus, ResourceChange};
use cdkreport_types::report::{FailureKind, ReportRun, StackFailure, ToolInfo};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

fn available(stack: &str, changes: Vec<ResourceChange>) -> ChangesetResult {
    ChangesetResult {
        stack_name: stack.to_string(),
        changeset_name: "pr-42".to_string(),
        status: ChangesetStatus::Available,
        status_reason: None,
        execution_status: Some("AVAILABLE".to_string()),
        changes,
    }
}

fn three_changes() -> Vec<ResourceChange> {
    vec![
        ResourceChange::new(ChangeAction::Add, "Bucket1", "AWS::S3::Bucket"),
        ResourceChange::new(ChangeAction::Modify, "Func1", "AWS::Lambda::Function"),
        ResourceChange::new(ChangeAction::Remove, "Role1", "AWS::IAM::Role"),
    ]
}

fn recreating(id: &str, level: &str) -> ResourceChange {
    let mut change = ResourceChange::new(ChangeAction::Modify, id, "AWS::Lambda::Function");
    change.details.insert(
        "Details".to_string(),
        json!([{
            "Target": {"Attribute": "Properties", "Name": "FunctionName", "RequiresRecreation": level},
            "Evaluation": "Static",
            "ChangeSource": "DirectModification"
        }]),
    );
    change
}

fn run(results: Vec<ChangesetResult>, failures: Vec<StackFailure>) -> ReportRun {
    let mut run = ReportRun::new(
        ToolInfo {
            name: "cdkreport".to_string(),
            version: Some("0.1.0".to_string()),
        },
        "pr-42",
    );
    run.generated_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    run.results = results;
    run.failures = failures;
    run
}

fn role_failure(stack: &str) -> StackFailure {
    StackFailure {
        stack_name: stack.to_string(),
        kind: FailureKind::RoleAssumption,
        message: format!("stack {stack}: cannot assume lookup role: AccessDenied"),
        attempts: 1,
    }
}

#[test]
fn text_lists_changes_in_received_order() {
    let out = format_result(&available("app", three_changes()));
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Stack app: changeset 'pr-42'");
    assert_eq!(
        &lines[1..],
        &[
            "  add      Bucket1 (AWS::S3::Bucket)",
            "  modify   Func1 (AWS::Lambda::Function)",
            "  remove   Role1 (AWS::IAM::Role)",
        ]
    );
}

#[test]
fn text_not_found_is_one_line() {
    let out = format_result(&ChangesetResult::not_found("app", "pr-42"));
    assert_eq!(out, "Stack app: changeset 'pr-42' not found\n");
}

#[test]
fn text_failed_shows_reason() {
    let mut result = available("app", Vec::new());
    result.status = ChangesetStatus::Failed;
    result.status_reason = Some("The submitted information didn't contain changes.".to_string());

    assert_eq!(
        format_result(&result),
        "Stack app: changeset 'pr-42' failed: The submitted information didn't contain changes.\n"
    );
}

#[test]
fn text_empty_changeset_says_so() {
    let out = format_result(&available("app", Vec::new()));
    assert_eq!(out, "Stack app: changeset 'pr-42'\n  no resource changes\n");
}

#[test]
fn text_pending_is_labelled() {
    let mut result = available("app", three_changes());
    result.status = ChangesetStatus::Pending;
    let out = format_result(&result);
    assert!(out.starts_with("Stack app: changeset 'pr-42' (pending"));
}

#[test]
fn text_marks_recreation() {
    let out = format_result(&available("app", vec![recreating("Func1", "Always")]));
    assert!(out.contains("Func1 (AWS::Lambda::Function) [recreation: Always]"));
}

#[test]
fn failure_line_names_stack_and_kind() {
    assert_eq!(
        format_failure(&role_failure("a")),
        "  a [role assumption]: stack a: cannot assume lookup role: AccessDenied\n"
    );
}

#[test]
fn markdown_table_sorted_by_action() {
    let changes = vec![
        ResourceChange::new(ChangeAction::Remove, "Role1", "AWS::IAM::Role"),
        ResourceChange::new(ChangeAction::Add, "Bucket1", "AWS::S3::Bucket"),
    ];
    let out = render_markdown(&available("app", changes));

    let expected = "
<details>
<summary>Changeset for stack <strong>app</strong></summary>

| Action | Requires Recreation | Resource Type | Logical Resource Id | Change Target | Change Reason |
| --- | --- | --- | --- | --- | --- |
| Add | No | AWS::S3::Bucket | Bucket1 |  |  |
| Remove | No | AWS::IAM::Role | Role1 |  |  |

</details>
";
    assert_eq!(out, expected);
}

#[test]
fn markdown_warns_on_recreation() {
    let out = render_markdown(&available("app", vec![recreating("Func1", "Conditionally")]));

    assert!(out.contains(
        "<summary>Changeset for stack <strong>app</strong> (🚨 resources requires recreation 🚨)</summary>"
    ));
    assert!(out.contains(
        "| Modify | ### $\\textcolor{red}{\\textsf{Conditionally}}$ | AWS::Lambda::Function | Func1 | FunctionName | DirectModification |"
    ));
}

#[test]
fn markdown_never_recreate_has_no_warning() {
    let out = render_markdown(&available("app", vec![recreating("Func1", "Never")]));
    assert!(!out.contains("🚨"));
    assert!(out.contains("| Modify | Never |"));
}

#[test]
fn markdown_truncates_long_logical_ids() {
    let id = format!("{}Middle{}", "Head".repeat(8), "Tail".repeat(8));
    let out = render_markdown(&available(
        "app",
        vec![ResourceChange::new(ChangeAction::Add, id, "AWS::SNS::Topic")],
    ));
    assert!(out.contains("| HeadHeadHeadHeadHeadHe(...)ilTailTailTailTailTail |"));
}

#[test]
fn markdown_not_found_block() {
    let out = render_markdown(&ChangesetResult::not_found("app", "pr-42"));
    assert!(out.contains("<strong>app</strong> (not found)"));
    assert!(out.contains("_No changeset named `pr-42`._"));
}

#[test]
fn json_document_carries_schema_and_failures() {
    let report = run(vec![available("b", three_changes())], vec![role_failure("a")]);
    let doc: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();

    assert_eq!(doc["schema"], "cdkreport.run.v1");
    assert_eq!(doc["changeset_name"], "pr-42");
    assert_eq!(doc["results"][0]["stack_name"], "b");
    assert_eq!(doc["results"][0]["changes"][1]["action"], "modify");
    assert_eq!(doc["failures"][0]["kind"], "role_assumption");
}

#[test]
fn yaml_document_lists_results() {
    let report = run(vec![available("b", three_changes())], Vec::new());
    let out = render_yaml(&report).unwrap();

    assert!(out.contains("schema: cdkreport.run.v1"));
    assert!(out.contains("stack_name: b"));
    assert!(out.contains("logical_id: Bucket1"));
    assert!(!out.contains("failures"));
}

#[test]
fn write_report_text_appends_failure_summary() {
    let report = run(vec![available("b", three_changes())], vec![role_failure("a")]);
    let mut buf = Vec::new();
    write_report(&mut buf, &report, OutputFormat::Text).unwrap();
    let out = String::from_utf8(buf).unwrap();

    let expected = "\
Stack b: changeset 'pr-42'
  add      Bucket1 (AWS::S3::Bucket)
  modify   Func1 (AWS::Lambda::Function)
  remove   Role1 (AWS::IAM::Role)

1 stack(s) could not be reported:
  a [role assumption]: stack a: cannot assume lookup role: AccessDenied
";
    assert_eq!(out, expected);
}

#[test]
fn write_report_markdown_lists_failed_stacks() {
    let report = run(Vec::new(), vec![role_failure("a")]);
    let mut buf = Vec::new();
    write_report(&mut buf, &report, OutputFormat::Markdown).unwrap();
    let out = String::from_utf8(buf).unwrap();

    assert!(out.contains("**Stacks that could not be reported**"));
    assert!(out.contains("- `a` (role assumption): stack a: cannot assume lookup role: AccessDenied"));
}
