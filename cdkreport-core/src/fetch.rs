//! Per-stack changeset retrieval through the provider ports.

use crate::ports::{CallError, ChangesetClient, ChangesetDescription, CredentialProvider};
use crate::retry::{RetryExhausted, RetryPolicy, with_retry};
use cdkreport_assembly::{Environment, has_placeholders, resolve_placeholders};
use cdkreport_types::changeset::{ChangesetResult, ChangesetStatus};
use cdkreport_types::report::{FailureKind, StackFailure};
use cdkreport_types::stack::StackDescriptor;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// Per-stack failure. Never aborts the remaining stacks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("stack {stack}: cannot assume lookup role {role_arn}: {cause}")]
    RoleAssumption {
        stack: String,
        role_arn: String,
        attempts: u32,
        cause: CallError,
    },

    #[error("stack {stack}: changeset query failed after {attempts} attempt(s): {cause}")]
    ChangesetFetch {
        stack: String,
        attempts: u32,
        cause: CallError,
    },
}

impl FetchError {
    pub fn stack_name(&self) -> &str {
        match self {
            FetchError::RoleAssumption { stack, .. } | FetchError::ChangesetFetch { stack, .. } => {
                stack
            }
        }
    }

    pub fn to_failure(&self) -> StackFailure {
        let (kind, attempts) = match self {
            FetchError::RoleAssumption { attempts, .. } => (FailureKind::RoleAssumption, *attempts),
            FetchError::ChangesetFetch { attempts, .. } => (FailureKind::ChangesetFetch, *attempts),
        };
        StackFailure {
            stack_name: self.stack_name().to_string(),
            kind,
            message: self.to_string(),
            attempts,
        }
    }
}

/// Map a provider status string onto [`ChangesetStatus`].
///
/// Unknown statuses count as failed and carry a reason naming them.
pub fn map_status(description: &ChangesetDescription) -> (ChangesetStatus, Option<String>) {
    let status = match description.status.as_str() {
        "CREATE_PENDING" | "CREATE_IN_PROGRESS" | "DELETE_PENDING" | "DELETE_IN_PROGRESS" => {
            ChangesetStatus::Pending
        }
        "CREATE_COMPLETE" => ChangesetStatus::Available,
        "FAILED" | "DELETE_FAILED" => ChangesetStatus::Failed,
        "DELETE_COMPLETE" => ChangesetStatus::NotFound,
        other => {
            return (
                ChangesetStatus::Failed,
                Some(format!("unrecognised changeset status '{other}'")),
            );
        }
    };
    (status, description.status_reason.clone())
}

/// Fetches one changeset per stack using the stack's lookup role.
pub struct ChangesetFetcher<'a> {
    credentials: &'a dyn CredentialProvider,
    client: &'a dyn ChangesetClient,
    retry: RetryPolicy,
    /// Region for stacks whose environment does not name one.
    default_region: Option<String>,
    caller_account: Mutex<Option<String>>,
}

impl<'a> ChangesetFetcher<'a> {
    pub fn new(
        credentials: &'a dyn CredentialProvider,
        client: &'a dyn ChangesetClient,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            credentials,
            client,
            retry,
            default_region: None,
            caller_account: Mutex::new(None),
        }
    }

    pub fn with_default_region(mut self, region: Option<String>) -> Self {
        self.default_region = region;
        self
    }

    pub async fn fetch(
        &self,
        stack: &StackDescriptor,
        changeset_name: &str,
    ) -> Result<ChangesetResult, FetchError> {
        let bound = self.bind(stack).await?;
        let stack = &bound;
        let region = stack.region.as_deref();

        let credentials = with_retry(&self.retry, "assume_role", &stack.name, || {
            self.credentials.assume_role(&stack.lookup_role_arn, region)
        })
        .await
        .map_err(|RetryExhausted { error, attempts }| FetchError::RoleAssumption {
            stack: stack.name.clone(),
            role_arn: stack.lookup_role_arn.clone(),
            attempts,
            cause: error,
        })?;

        debug!(stack = %stack.name, role = %stack.lookup_role_arn, "assumed lookup role");

        let described = with_retry(&self.retry, "describe_change_set", &stack.name, || {
            self.client
                .describe_change_set(&credentials, stack, changeset_name)
        })
        .await;

        let description = match described {
            Ok(description) => description,
            Err(RetryExhausted {
                error: CallError::NotFound(reason),
                ..
            }) => {
                info!(stack = %stack.name, changeset = changeset_name, reason = %reason, "changeset not found");
                return Ok(ChangesetResult::not_found(&stack.name, changeset_name));
            }
            Err(RetryExhausted { error, attempts }) => {
                return Err(FetchError::ChangesetFetch {
                    stack: stack.name.clone(),
                    attempts,
                    cause: error,
                });
            }
        };

        let (status, status_reason) = map_status(&description);
        let changes = if status == ChangesetStatus::NotFound {
            Vec::new()
        } else {
            description.changes
        };

        debug!(
            stack = %stack.name,
            status = %status,
            changes = changes.len(),
            "fetched changeset"
        );

        Ok(ChangesetResult {
            stack_name: stack.name.clone(),
            changeset_name: changeset_name.to_string(),
            status,
            status_reason,
            execution_status: description.execution_status,
            changes,
        })
    }
}

impl ChangesetFetcher<'_> {
    /// Fill in what an environment-agnostic stack leaves open: the default
    /// region and the caller's account.
    async fn bind(&self, stack: &StackDescriptor) -> Result<StackDescriptor, FetchError> {
        let mut bound = stack.clone();
        if bound.region.is_none() {
            bound.region = self.default_region.clone();
        }
        if !has_placeholders(&bound.lookup_role_arn) {
            return Ok(bound);
        }

        if bound.account.is_none() && bound.lookup_role_arn.contains("${AWS::AccountId}") {
            bound.account = Some(self.caller_account(stack).await?);
        }

        let env = Environment {
            account: bound.account.clone(),
            region: bound.region.clone(),
        };
        bound.lookup_role_arn = resolve_placeholders(&bound.lookup_role_arn, &env);

        if has_placeholders(&bound.lookup_role_arn) {
            let reason = if bound.region.is_none() {
                "stack is environment-agnostic and no region is configured (use --region or [aws].region)"
            } else {
                "lookup role ARN has placeholders that cannot be resolved"
            };
            return Err(FetchError::RoleAssumption {
                stack: stack.name.clone(),
                role_arn: stack.lookup_role_arn.clone(),
                attempts: 0,
                cause: CallError::Rejected(reason.to_string()),
            });
        }

        debug!(
            stack = %stack.name,
            role = %bound.lookup_role_arn,
            region = bound.region.as_deref().unwrap_or("unset"),
            "bound environment-agnostic stack"
        );
        Ok(bound)
    }

    async fn caller_account(&self, stack: &StackDescriptor) -> Result<String, FetchError> {
        if let Some(account) = self.caller_account.lock().ok().and_then(|a| a.clone()) {
            return Ok(account);
        }

        let account = with_retry(&self.retry, "caller_account", &stack.name, || {
            self.credentials.caller_account()
        })
        .await
        .map_err(|RetryExhausted { error, attempts }| FetchError::RoleAssumption {
            stack: stack.name.clone(),
            role_arn: stack.lookup_role_arn.clone(),
            attempts,
            cause: error,
        })?;

        if let Ok(mut cached) = self.caller_account.lock() {
            *cached = Some(account.clone());
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn described(status: &str, reason: Option<&str>) -> ChangesetDescription {
        ChangesetDescription {
            status: status.to_string(),
            status_reason: reason.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn maps_provider_statuses() {
        assert_eq!(map_status(&described("CREATE_PENDING", None)).0, ChangesetStatus::Pending);
        assert_eq!(map_status(&described("CREATE_IN_PROGRESS", None)).0, ChangesetStatus::Pending);
        assert_eq!(map_status(&described("CREATE_COMPLETE", None)).0, ChangesetStatus::Available);
        assert_eq!(map_status(&described("DELETE_COMPLETE", None)).0, ChangesetStatus::NotFound);
        assert_eq!(map_status(&described("DELETE_FAILED", None)).0, ChangesetStatus::Failed);
    }

    #[test]
    fn failed_keeps_provider_reason() {
        let (status, reason) = map_status(&described(
            "FAILED",
            Some("The submitted information didn't contain changes."),
        ));
        assert_eq!(status, ChangesetStatus::Failed);
        assert_eq!(
            reason.as_deref(),
            Some("The submitted information didn't contain changes.")
        );
    }

    #[test]
    fn unknown_status_is_failed_with_reason() {
        let (status, reason) = map_status(&described("SOMETHING_NEW", None));
        assert_eq!(status, ChangesetStatus::Failed);
        assert!(reason.unwrap().contains("SOMETHING_NEW"));
    }

    #[test]
    fn failure_record_names_stack_and_kind() {
        let err = FetchError::RoleAssumption {
            stack: "app-prod".into(),
            role_arn: "arn:aws:iam::1:role/lookup".into(),
            attempts: 1,
            cause: CallError::Rejected("AccessDenied".into()),
        };
        let failure = err.to_failure();
        assert_eq!(failure.stack_name, "app-prod");
        assert_eq!(failure.kind, FailureKind::RoleAssumption);
        assert!(failure.message.contains("AccessDenied"));
    }
}
