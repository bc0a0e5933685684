//! Artifact environment strings and ARN placeholder resolution.

const UNKNOWN_ACCOUNT: &str = "unknown-account";
const UNKNOWN_REGION: &str = "unknown-region";

/// Target of a stack artifact, parsed from `aws://ACCOUNT/REGION`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl Environment {
    /// Parse an environment string. Agnostic parts (`unknown-*`) become `None`.
    ///
    /// Returns `None` when the string is not an `aws://` environment.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix("aws://")?;
        let (account, region) = rest.split_once('/')?;
        if account.is_empty() || region.is_empty() || region.contains('/') {
            return None;
        }
        Some(Self {
            account: known(account, UNKNOWN_ACCOUNT),
            region: known(region, UNKNOWN_REGION),
        })
    }
}

fn known(value: &str, unknown: &str) -> Option<String> {
    (value != unknown).then(|| value.to_string())
}

/// AWS partition owning `region`.
pub fn partition_for_region(region: Option<&str>) -> &'static str {
    match region {
        Some(r) if r.starts_with("cn-") => "aws-cn",
        Some(r) if r.starts_with("us-gov-") => "aws-us-gov",
        Some(r) if r.starts_with("us-iso-") => "aws-iso",
        Some(r) if r.starts_with("us-isob-") => "aws-iso-b",
        _ => "aws",
    }
}

/// Substitute the `${AWS::...}` pseudo parameters CDK leaves in role ARNs.
///
/// Only placeholders whose value is known are replaced. The partition depends
/// on the region, so it stays a placeholder while the region is unknown.
/// Leftovers are reported by [`has_placeholders`].
pub fn resolve_placeholders(arn: &str, env: &Environment) -> String {
    let mut out = arn.to_string();
    if let Some(region) = &env.region {
        out = out
            .replace("${AWS::Partition}", partition_for_region(Some(region)))
            .replace("${AWS::Region}", region);
    }
    if let Some(account) = &env.account {
        out = out.replace("${AWS::AccountId}", account);
    }
    out
}

pub fn has_placeholders(arn: &str) -> bool {
    arn.contains("${")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_concrete_environment() {
        let env = Environment::parse("aws://123456789012/eu-west-1").unwrap();
        assert_eq!(env.account.as_deref(), Some("123456789012"));
        assert_eq!(env.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn agnostic_parts_are_none() {
        let env = Environment::parse("aws://unknown-account/unknown-region").unwrap();
        assert_eq!(env, Environment::default());
    }

    #[test]
    fn rejects_non_aws_environment() {
        assert!(Environment::parse("gcp://project/zone").is_none());
        assert!(Environment::parse("aws://123456789012").is_none());
    }

    #[test]
    fn partition_follows_region() {
        assert_eq!(partition_for_region(Some("cn-north-1")), "aws-cn");
        assert_eq!(partition_for_region(Some("us-gov-west-1")), "aws-us-gov");
        assert_eq!(partition_for_region(Some("us-east-1")), "aws");
        assert_eq!(partition_for_region(None), "aws");
    }

    #[test]
    fn resolves_known_placeholders() {
        let env = Environment::parse("aws://123456789012/cn-north-1").unwrap();
        let arn = resolve_placeholders(
            "arn:${AWS::Partition}:iam::${AWS::AccountId}:role/cdk-hnb659fds-lookup-role-${AWS::AccountId}-${AWS::Region}",
            &env,
        );
        assert_eq!(
            arn,
            "arn:aws-cn:iam::123456789012:role/cdk-hnb659fds-lookup-role-123456789012-cn-north-1"
        );
    }

    #[test]
    fn leaves_unknown_placeholders() {
        let arn = resolve_placeholders(
            "arn:${AWS::Partition}:iam::${AWS::AccountId}:role/lookup",
            &Environment::default(),
        );
        assert_eq!(arn, "arn:${AWS::Partition}:iam::${AWS::AccountId}:role/lookup");
        assert!(has_placeholders(&arn));
    }

    #[test]
    fn region_only_environment_resolves_partition_and_region() {
        let env = Environment {
            account: None,
            region: Some("us-gov-west-1".to_string()),
        };
        let arn = resolve_placeholders(
            "arn:${AWS::Partition}:iam::${AWS::AccountId}:role/lookup-${AWS::Region}",
            &env,
        );
        assert_eq!(arn, "arn:aws-us-gov:iam::${AWS::AccountId}:role/lookup-us-gov-west-1");
    }
}
