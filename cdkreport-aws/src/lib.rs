//! AWS-backed implementations of the cdkreport ports.
//!
//! [`StsCredentialProvider`] assumes each stack's lookup role through STS and
//! [`CloudFormationChangesetClient`] reads the changeset with the resulting
//! credentials. Both share one base [`SdkConfig`](aws_config::SdkConfig) built by
//! [`load_base_config`], which disables SDK-level retries so the pipeline's
//! retry policy is the only one in play.

mod classify;
mod cloudformation;
mod settings;
mod sts;

pub use cloudformation::{CloudFormationChangesetClient, convert_resource_change};
pub use settings::{AwsSettings, load_base_config};
pub use sts::{StsCredentialProvider, session_name};
