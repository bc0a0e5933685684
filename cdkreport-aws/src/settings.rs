use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::time::Duration;
use tracing::debug;

/// Connection and identity settings shared by the AWS adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    /// Named profile for the caller's own credentials.
    pub profile: Option<String>,
    /// Region used for stacks whose environment is region-agnostic.
    pub default_region: Option<String>,
    pub session_name_prefix: String,
    pub session_duration: Duration,
    pub connect_timeout: Duration,
    pub attempt_timeout: Duration,
    pub operation_timeout: Duration,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            profile: None,
            default_region: None,
            session_name_prefix: "cdkreport".to_string(),
            // STS minimum; the lookups finish well within it.
            session_duration: Duration::from_secs(900),
            connect_timeout: Duration::from_secs(10),
            attempt_timeout: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(60),
        }
    }
}

/// Load the caller's base configuration with cdkreport's timeouts applied.
pub async fn load_base_config(settings: &AwsSettings) -> SdkConfig {
    let timeouts = TimeoutConfig::builder()
        .connect_timeout(settings.connect_timeout)
        .operation_attempt_timeout(settings.attempt_timeout)
        .operation_timeout(settings.operation_timeout)
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .timeout_config(timeouts)
        .retry_config(RetryConfig::disabled());

    if let Some(profile) = &settings.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &settings.default_region {
        loader = loader.region(Region::new(region.clone()));
    }

    let config = loader.load().await;
    debug!(
        profile = settings.profile.as_deref().unwrap_or("default"),
        region = config.region().map(|r| r.as_ref()).unwrap_or("unset"),
        "loaded base AWS configuration"
    );
    config
}
