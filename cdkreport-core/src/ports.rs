//! Port traits abstracting provider I/O away from the pipeline.

use async_trait::async_trait;
use cdkreport_types::changeset::ResourceChange;
use cdkreport_types::stack::StackDescriptor;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// How a provider call failed, as far as retry and reporting care.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The requested changeset (or its stack) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Throttling, timeouts and connection failures. Worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Anything else the provider refused (access denied, validation).
    #[error("{0}")]
    Rejected(String),
}

impl CallError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CallError::Transient(_))
    }
}

/// Temporary credentials obtained by assuming a lookup role.
#[derive(Clone, PartialEq, Eq)]
pub struct ScopedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<DateTime<Utc>>,
}

impl fmt::Debug for ScopedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Raw changeset description, before status mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangesetDescription {
    /// Provider status string, e.g. `CREATE_COMPLETE`.
    pub status: String,
    pub status_reason: Option<String>,
    pub execution_status: Option<String>,
    /// Every page of changes, in provider order.
    pub changes: Vec<ResourceChange>,
}

/// Exchanges a role ARN for temporary credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn assume_role(
        &self,
        role_arn: &str,
        region: Option<&str>,
    ) -> Result<ScopedCredentials, CallError>;

    /// Account id of the caller's own credentials.
    ///
    /// Environment-agnostic stacks deploy into this account.
    async fn caller_account(&self) -> Result<String, CallError>;
}

/// Reads changeset details with scoped credentials.
#[async_trait]
pub trait ChangesetClient: Send + Sync {
    async fn describe_change_set(
        &self,
        credentials: &ScopedCredentials,
        stack: &StackDescriptor,
        changeset_name: &str,
    ) -> Result<ChangesetDescription, CallError>;
}
