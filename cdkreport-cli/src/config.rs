//! Configuration file loading for cdkreport.
//!
//! Discovers and loads `cdkreport.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use cdkreport_aws::AwsSettings;
use cdkreport_core::retry::RetryPolicy;
use cdkreport_render::OutputFormat;
use fs_err as fs;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "cdkreport.toml";

/// Top-level configuration from cdkreport.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CdkreportConfig {
    pub aws: AwsConfig,
    pub retry: RetryConfig,
    pub timeouts: TimeoutsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Profile for the caller's own credentials.
    pub profile: Option<String>,

    /// Region used when a stack's environment does not name one.
    pub region: Option<String>,

    /// Prefix for assumed-role session names.
    pub session_name_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per provider call, first call included.
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub connect_secs: Option<u64>,
    pub attempt_secs: Option<u64>,
    pub operation_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
}

/// Discover the cdkreport.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a cdkreport.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<CdkreportConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<CdkreportConfig> {
    let config: CdkreportConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return default if not found.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<CdkreportConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(CdkreportConfig::default()),
    }
}

/// Values given on the command line that can override the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub format: Option<OutputFormat>,
}

/// Settings after applying CLI over file over built-in defaults.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub aws: AwsSettings,
    pub retry: RetryPolicy,
    pub format: OutputFormat,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: CdkreportConfig,
}

impl ConfigMerger {
    pub fn new(config: CdkreportConfig) -> Self {
        Self { config }
    }

    /// Merge with CLI arguments.
    ///
    /// Fails when the file asks for zero attempts or zero-length timeouts, or
    /// names a session prefix STS would refuse.
    pub fn merge(self, cli: CliOverrides) -> anyhow::Result<MergedConfig> {
        let CdkreportConfig {
            aws,
            retry,
            timeouts,
            output,
        } = self.config;

        let defaults = AwsSettings::default();
        let aws = AwsSettings {
            profile: cli.profile.or(aws.profile),
            default_region: cli.region.or(aws.region),
            session_name_prefix: match aws.session_name_prefix {
                Some(prefix) => session_prefix(prefix)?,
                None => defaults.session_name_prefix,
            },
            session_duration: defaults.session_duration,
            connect_timeout: secs_or(timeouts.connect_secs, defaults.connect_timeout, "connect_secs")?,
            attempt_timeout: secs_or(timeouts.attempt_secs, defaults.attempt_timeout, "attempt_secs")?,
            operation_timeout: secs_or(
                timeouts.operation_secs,
                defaults.operation_timeout,
                "operation_secs",
            )?,
        };

        let mut policy = RetryPolicy::default();
        if let Some(max_attempts) = retry.max_attempts {
            if max_attempts == 0 {
                anyhow::bail!("retry.max_attempts must be at least 1");
            }
            policy.max_attempts = max_attempts;
        }
        if let Some(ms) = retry.initial_backoff_ms {
            policy.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = retry.max_backoff_ms {
            policy.max_backoff = Duration::from_millis(ms);
        }

        Ok(MergedConfig {
            aws,
            retry: policy,
            format: cli.format.or(output.format).unwrap_or_default(),
        })
    }
}

/// STS role session names only allow `[\w+=,.@-]`.
fn session_prefix(prefix: String) -> anyhow::Result<String> {
    if prefix.is_empty() {
        anyhow::bail!("aws.session_name_prefix must not be empty");
    }
    if let Some(bad) = prefix
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || "_+=,.@-".contains(*c)))
    {
        anyhow::bail!(
            "aws.session_name_prefix {prefix:?} contains {bad:?}; STS session names allow only letters, digits and _+=,.@-"
        );
    }
    Ok(prefix)
}

fn secs_or(value: Option<u64>, default: Duration, key: &str) -> anyhow::Result<Duration> {
    match value {
        Some(0) => anyhow::bail!("timeouts.{key} must be greater than zero"),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(default),
    }
}
