use crate::classify::{classify, is_missing_resource};
use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_cloudformation::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::operation::describe_change_set::DescribeChangeSetError;
use aws_sdk_cloudformation::types::{ResourceChange as SdkResourceChange, ResourceChangeDetail};
use cdkreport_core::ports::{CallError, ChangesetClient, ChangesetDescription, ScopedCredentials};
use cdkreport_types::changeset::{ChangeAction, ResourceChange};
use cdkreport_types::stack::StackDescriptor;
use serde_json::{Map, Value, json};
use std::fmt::Debug;
use std::time::SystemTime;
use tracing::{debug, warn};

const CREDENTIALS_SOURCE: &str = "cdkreport-lookup-role";

/// Reads changesets with the credentials of each stack's lookup role.
#[derive(Debug, Clone)]
pub struct CloudFormationChangesetClient {
    base: SdkConfig,
}

impl CloudFormationChangesetClient {
    pub fn new(base: SdkConfig) -> Self {
        Self { base }
    }

    fn client_for(
        &self,
        credentials: &ScopedCredentials,
        stack: &StackDescriptor,
    ) -> aws_sdk_cloudformation::Client {
        let credentials = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            credentials.expiration.map(SystemTime::from),
            CREDENTIALS_SOURCE,
        );
        let mut builder =
            aws_sdk_cloudformation::config::Builder::from(&self.base).credentials_provider(credentials);
        if let Some(region) = &stack.region {
            builder = builder.region(Region::new(region.clone()));
        }
        aws_sdk_cloudformation::Client::from_conf(builder.build())
    }
}

#[async_trait]
impl ChangesetClient for CloudFormationChangesetClient {
    async fn describe_change_set(
        &self,
        credentials: &ScopedCredentials,
        stack: &StackDescriptor,
        changeset_name: &str,
    ) -> Result<ChangesetDescription, CallError> {
        let client = self.client_for(credentials, stack);
        describe_pages(&client, &stack.name, changeset_name).await
    }
}

/// Read every page of a changeset. Status fields come from the first page.
async fn describe_pages(
    client: &aws_sdk_cloudformation::Client,
    stack_name: &str,
    changeset_name: &str,
) -> Result<ChangesetDescription, CallError> {
    let mut description = ChangesetDescription::default();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = client
            .describe_change_set()
            .stack_name(stack_name)
            .change_set_name(changeset_name)
            .set_next_token(next_token.take())
            .send()
            .await
            .map_err(|err| classify_describe(&err))?;
        pages += 1;

        if pages == 1 {
            description.status = page
                .status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default();
            description.status_reason = page.status_reason().map(str::to_string);
            description.execution_status = page.execution_status().map(|s| s.as_str().to_string());
        }

        description.changes.extend(
            page.changes()
                .iter()
                .filter_map(|change| change.resource_change())
                .map(convert_resource_change),
        );

        match page.next_token() {
            Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
            _ => break,
        }
    }

    debug!(
        stack = stack_name,
        changeset = changeset_name,
        pages,
        changes = description.changes.len(),
        "described changeset"
    );
    Ok(description)
}

fn classify_describe<R: Debug>(err: &SdkError<DescribeChangeSetError, R>) -> CallError {
    if let Some(service) = err.as_service_error() {
        if service.is_change_set_not_found_exception()
            || is_missing_resource(service.code(), service.message())
        {
            return CallError::NotFound(
                service
                    .message()
                    .unwrap_or("changeset does not exist")
                    .to_string(),
            );
        }
    }
    classify(err)
}

/// Convert one provider resource change, keeping its details verbatim.
pub fn convert_resource_change(change: &SdkResourceChange) -> ResourceChange {
    let raw_action = change.action().map(|a| a.as_str()).unwrap_or_default();
    let action = ChangeAction::from_provider(raw_action).unwrap_or_else(|| {
        warn!(
            action = raw_action,
            logical_id = change.logical_resource_id().unwrap_or_default(),
            "unrecognised change action, reporting as modify"
        );
        ChangeAction::Modify
    });

    let mut details = Map::new();
    if let Some(id) = change.physical_resource_id() {
        details.insert("PhysicalResourceId".to_string(), json!(id));
    }
    if let Some(replacement) = change.replacement() {
        details.insert("Replacement".to_string(), json!(replacement.as_str()));
    }
    if !change.scope().is_empty() {
        let scope: Vec<&str> = change.scope().iter().map(|s| s.as_str()).collect();
        details.insert("Scope".to_string(), json!(scope));
    }
    if !change.details().is_empty() {
        let entries: Vec<Value> = change.details().iter().map(detail_to_json).collect();
        details.insert("Details".to_string(), Value::Array(entries));
    }
    if action.as_str() != raw_action.to_ascii_lowercase() {
        details.insert("Action".to_string(), json!(raw_action));
    }

    ResourceChange {
        logical_id: change.logical_resource_id().unwrap_or_default().to_string(),
        resource_type: change.resource_type().unwrap_or_default().to_string(),
        action,
        details,
    }
}

fn detail_to_json(detail: &ResourceChangeDetail) -> Value {
    let mut entry = Map::new();
    if let Some(target) = detail.target() {
        let mut t = Map::new();
        if let Some(attribute) = target.attribute() {
            t.insert("Attribute".to_string(), json!(attribute.as_str()));
        }
        if let Some(name) = target.name() {
            t.insert("Name".to_string(), json!(name));
        }
        if let Some(recreation) = target.requires_recreation() {
            t.insert("RequiresRecreation".to_string(), json!(recreation.as_str()));
        }
        entry.insert("Target".to_string(), Value::Object(t));
    }
    if let Some(evaluation) = detail.evaluation() {
        entry.insert("Evaluation".to_string(), json!(evaluation.as_str()));
    }
    if let Some(source) = detail.change_source() {
        entry.insert("ChangeSource".to_string(), json!(source.as_str()));
    }
    if let Some(entity) = detail.causing_entity() {
        entry.insert("CausingEntity".to_string(), json!(entity));
    }
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudformation::types::{
        ChangeAction as SdkAction, ChangeSource, EvaluationType, Replacement, RequiresRecreation,
        ResourceAttribute, ResourceTargetDefinition,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_modify_with_details() {
        let change = SdkResourceChange::builder()
            .action(SdkAction::Modify)
            .logical_resource_id("Func1")
            .physical_resource_id("app-Func1-ABC")
            .resource_type("AWS::Lambda::Function")
            .replacement(Replacement::True)
            .scope(ResourceAttribute::Properties)
            .details(
                ResourceChangeDetail::builder()
                    .target(
                        ResourceTargetDefinition::builder()
                            .attribute(ResourceAttribute::Properties)
                            .name("FunctionName")
                            .requires_recreation(RequiresRecreation::Always)
                            .build(),
                    )
                    .evaluation(EvaluationType::Static)
                    .change_source(ChangeSource::DirectModification)
                    .build(),
            )
            .build();

        let converted = convert_resource_change(&change);

        assert_eq!(converted.logical_id, "Func1");
        assert_eq!(converted.resource_type, "AWS::Lambda::Function");
        assert_eq!(converted.action, ChangeAction::Modify);
        assert_eq!(
            Value::Object(converted.details.clone()),
            json!({
                "PhysicalResourceId": "app-Func1-ABC",
                "Replacement": "True",
                "Scope": ["Properties"],
                "Details": [{
                    "Target": {
                        "Attribute": "Properties",
                        "Name": "FunctionName",
                        "RequiresRecreation": "Always"
                    },
                    "Evaluation": "Static",
                    "ChangeSource": "DirectModification"
                }]
            })
        );
        assert!(converted.recreates());
    }

    #[test]
    fn converts_add_without_details() {
        let change = SdkResourceChange::builder()
            .action(SdkAction::Add)
            .logical_resource_id("Bucket1")
            .resource_type("AWS::S3::Bucket")
            .build();

        let converted = convert_resource_change(&change);

        assert_eq!(converted.action, ChangeAction::Add);
        assert!(converted.details.is_empty());
        assert_eq!(converted.requires_recreation(), None);
    }

    mod paging {
        use super::super::describe_pages;
        use aws_sdk_cloudformation::Client;
        use aws_sdk_cloudformation::config::retry::RetryConfig;
        use aws_sdk_cloudformation::error::ErrorMetadata;
        use aws_sdk_cloudformation::operation::describe_change_set::{
            DescribeChangeSetError, DescribeChangeSetOutput,
        };
        use aws_sdk_cloudformation::types::error::ChangeSetNotFoundException;
        use aws_sdk_cloudformation::types::{
            Change, ChangeAction as SdkAction, ChangeSetStatus, ExecutionStatus,
            ResourceChange as SdkResourceChange,
        };
        use aws_smithy_mocks::{RuleMode, mock, mock_client};
        use cdkreport_core::ports::CallError;
        use pretty_assertions::assert_eq;

        fn change(logical_id: &str, action: SdkAction) -> Change {
            Change::builder()
                .resource_change(
                    SdkResourceChange::builder()
                        .action(action)
                        .logical_resource_id(logical_id)
                        .resource_type("AWS::SQS::Queue")
                        .build(),
                )
                .build()
        }

        fn failing_client(error: fn() -> DescribeChangeSetError) -> Client {
            let rule = mock!(Client::describe_change_set).then_error(error);
            // SDK retries are off in production too; the caller's policy retries.
            mock_client!(
                aws_sdk_cloudformation,
                RuleMode::MatchAny,
                [&rule],
                |conf: aws_sdk_cloudformation::config::Builder| conf
                    .retry_config(RetryConfig::disabled())
            )
        }

        #[tokio::test]
        async fn reads_every_page_in_order() {
            let first = mock!(Client::describe_change_set)
                .match_requests(|req| req.next_token().is_none())
                .then_output(|| {
                    DescribeChangeSetOutput::builder()
                        .status(ChangeSetStatus::CreateComplete)
                        .execution_status(ExecutionStatus::Available)
                        .changes(change("Queue1", SdkAction::Add))
                        .changes(change("Queue2", SdkAction::Modify))
                        .next_token("page-2")
                        .build()
                });
            let second = mock!(Client::describe_change_set)
                .match_requests(|req| req.next_token() == Some("page-2"))
                .then_output(|| {
                    DescribeChangeSetOutput::builder()
                        .status(ChangeSetStatus::CreateInProgress)
                        .status_reason("later pages do not override the first")
                        .changes(change("Queue3", SdkAction::Remove))
                        .build()
                });
            let client = mock_client!(aws_sdk_cloudformation, RuleMode::MatchAny, [&first, &second]);

            let description = describe_pages(&client, "app", "pr-42").await.unwrap();

            assert_eq!(description.status, "CREATE_COMPLETE");
            assert_eq!(description.status_reason, None);
            assert_eq!(description.execution_status.as_deref(), Some("AVAILABLE"));
            let ids: Vec<&str> = description
                .changes
                .iter()
                .map(|c| c.logical_id.as_str())
                .collect();
            assert_eq!(ids, ["Queue1", "Queue2", "Queue3"]);
            assert_eq!(first.num_calls(), 1);
            assert_eq!(second.num_calls(), 1);
        }

        #[tokio::test]
        async fn missing_changeset_is_not_found() {
            let client = failing_client(|| {
                DescribeChangeSetError::ChangeSetNotFoundException(
                    ChangeSetNotFoundException::builder()
                        .message("ChangeSet [pr-42] does not exist")
                        .build(),
                )
            });

            let err = describe_pages(&client, "app", "pr-42").await.unwrap_err();
            assert_eq!(
                err,
                CallError::NotFound("ChangeSet [pr-42] does not exist".to_string())
            );
        }

        #[tokio::test]
        async fn missing_stack_is_not_found() {
            let client = failing_client(|| {
                DescribeChangeSetError::generic(
                    ErrorMetadata::builder()
                        .code("ValidationError")
                        .message("Stack [app] does not exist")
                        .build(),
                )
            });

            let err = describe_pages(&client, "app", "pr-42").await.unwrap_err();
            assert_eq!(err, CallError::NotFound("Stack [app] does not exist".to_string()));
        }

        #[tokio::test]
        async fn throttling_is_transient() {
            let client = failing_client(|| {
                DescribeChangeSetError::generic(
                    ErrorMetadata::builder()
                        .code("Throttling")
                        .message("Rate exceeded")
                        .build(),
                )
            });

            let err = describe_pages(&client, "app", "pr-42").await.unwrap_err();
            assert_eq!(err, CallError::Transient("Throttling: Rate exceeded".to_string()));
        }
    }
}
