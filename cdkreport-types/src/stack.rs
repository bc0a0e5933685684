use serde::{Deserialize, Serialize};

/// A stack artifact read from a Cloud Assembly.
///
/// `lookup_role_arn` has its `${AWS::...}` placeholders resolved at load time
/// wherever the artifact environment names the value. Environment-agnostic
/// stacks keep the remaining placeholders until the fetcher binds them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackDescriptor {
    /// CloudFormation stack name.
    pub name: String,

    pub lookup_role_arn: String,

    /// Target region from the artifact environment, if it is not agnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Target account from the artifact environment, if it is not agnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Manifest key of the artifact (differs from `name` when `stackName` is set).
    pub artifact_id: String,
}

impl StackDescriptor {
    pub fn new(name: impl Into<String>, lookup_role_arn: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            artifact_id: name.clone(),
            name,
            lookup_role_arn: lookup_role_arn.into(),
            region: None,
            account: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}
