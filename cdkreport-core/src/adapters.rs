//! In-memory port implementations for embedding and testing.

use crate::ports::{
    CallError, ChangesetClient, ChangesetDescription, CredentialProvider, ScopedCredentials,
};
use async_trait::async_trait;
use cdkreport_types::stack::StackDescriptor;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tracing::debug;

/// Account id reported by [`InMemoryCredentialProvider::caller_account`].
pub const IN_MEMORY_ACCOUNT: &str = "123456789012";

/// Hands out fixed credentials for every role except the denied ones.
#[derive(Debug, Default)]
pub struct InMemoryCredentialProvider {
    denied: HashSet<String>,
    identity_error: Option<CallError>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `caller_account` fail with `error`.
    pub fn without_identity(mut self, error: CallError) -> Self {
        self.identity_error = Some(error);
        self
    }

    /// Make `assume_role` reject this role ARN.
    pub fn deny(mut self, role_arn: impl Into<String>) -> Self {
        self.denied.insert(role_arn.into());
        self
    }

    /// Role ARNs requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentialProvider {
    async fn assume_role(
        &self,
        role_arn: &str,
        _region: Option<&str>,
    ) -> Result<ScopedCredentials, CallError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(role_arn.to_string());
        }
        if self.denied.contains(role_arn) {
            return Err(CallError::Rejected(format!(
                "AccessDenied: not authorized to perform sts:AssumeRole on {role_arn}"
            )));
        }
        Ok(ScopedCredentials {
            access_key_id: "ASIAINMEMORY".to_string(),
            secret_access_key: "in-memory-secret".to_string(),
            session_token: format!("session-for-{role_arn}"),
            expiration: None,
        })
    }

    async fn caller_account(&self) -> Result<String, CallError> {
        match &self.identity_error {
            Some(error) => Err(error.clone()),
            None => Ok(IN_MEMORY_ACCOUNT.to_string()),
        }
    }
}

/// Replays scripted responses per stack name.
///
/// Each call pops the next response queued for the stack; an exhausted queue
/// answers `NotFound`.
#[derive(Debug, Default)]
pub struct InMemoryChangesetClient {
    responses: Mutex<HashMap<String, VecDeque<Result<ChangesetDescription, CallError>>>>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryChangesetClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(
        self,
        stack_name: impl Into<String>,
        response: Result<ChangesetDescription, CallError>,
    ) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses
                .entry(stack_name.into())
                .or_default()
                .push_back(response);
        }
        self
    }

    /// Stack names queried so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChangesetClient for InMemoryChangesetClient {
    async fn describe_change_set(
        &self,
        _credentials: &ScopedCredentials,
        stack: &StackDescriptor,
        changeset_name: &str,
    ) -> Result<ChangesetDescription, CallError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(stack.name.clone());
        }
        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut r| r.get_mut(&stack.name).and_then(VecDeque::pop_front));

        match next {
            Some(response) => response,
            None => {
                debug!(stack = %stack.name, changeset = changeset_name, "no scripted response");
                Err(CallError::NotFound(format!(
                    "ChangeSet [{changeset_name}] does not exist"
                )))
            }
        }
    }
}
