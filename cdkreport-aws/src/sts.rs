use crate::classify::classify;
use crate::settings::AwsSettings;
use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use cdkreport_core::ports::{CallError, CredentialProvider, ScopedCredentials};
use chrono::DateTime;
use tracing::debug;
use uuid::Uuid;

/// STS caps role session names at 64 characters.
const MAX_SESSION_NAME_LEN: usize = 64;

/// Build a unique role session name from `prefix`.
pub fn session_name(prefix: &str) -> String {
    let mut name = format!("{prefix}-{}", Uuid::new_v4().simple());
    if name.len() > MAX_SESSION_NAME_LEN {
        let cut = name.len() - MAX_SESSION_NAME_LEN;
        name.drain(..cut);
    }
    name
}

/// Assumes lookup roles with the caller's own credentials.
#[derive(Debug, Clone)]
pub struct StsCredentialProvider {
    base: SdkConfig,
    settings: AwsSettings,
}

impl StsCredentialProvider {
    pub fn new(base: SdkConfig, settings: AwsSettings) -> Self {
        Self { base, settings }
    }

    fn client(&self, region: Option<&str>) -> aws_sdk_sts::Client {
        let mut builder = aws_sdk_sts::config::Builder::from(&self.base);
        if let Some(region) = region {
            builder = builder.region(Region::new(region.to_string()));
        }
        aws_sdk_sts::Client::from_conf(builder.build())
    }
}

#[async_trait]
impl CredentialProvider for StsCredentialProvider {
    async fn assume_role(
        &self,
        role_arn: &str,
        region: Option<&str>,
    ) -> Result<ScopedCredentials, CallError> {
        let client = self.client(region);

        let session = session_name(&self.settings.session_name_prefix);
        debug!(role_arn, session = %session, "assuming lookup role");

        let duration = i32::try_from(self.settings.session_duration.as_secs()).unwrap_or(i32::MAX);
        let output = client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session)
            .duration_seconds(duration)
            .send()
            .await
            .map_err(|err| classify(&err))?;

        let credentials = output.credentials().ok_or_else(|| {
            CallError::Rejected(format!("AssumeRole for {role_arn} returned no credentials"))
        })?;

        Ok(ScopedCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: DateTime::from_timestamp(credentials.expiration().secs(), 0),
        })
    }

    async fn caller_account(&self) -> Result<String, CallError> {
        let output = self
            .client(None)
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| classify(&err))?;

        let account = output
            .account()
            .ok_or_else(|| CallError::Rejected("GetCallerIdentity returned no account".to_string()))?;
        debug!(account, "resolved caller account");
        Ok(account.to_string())
    }
}
