mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use cdkreport_aws::{CloudFormationChangesetClient, StsCredentialProvider, load_base_config};
use cdkreport_core::fetch::ChangesetFetcher;
use cdkreport_core::pipeline::{self, EXIT_STACK_FAILURE, EXIT_USAGE};
use cdkreport_core::selector::StackSelection;
use cdkreport_core::settings::{DEFAULT_ASSEMBLY_DIR, ReportSettings};
use cdkreport_render::{OutputFormat, write_report};
use cdkreport_types::report::ToolInfo;
use clap::Parser;
use config::{CliOverrides, ConfigMerger, MergedConfig};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "cdkreport",
    version,
    about = "Report the CloudFormation changesets of the stacks in a CDK cloud assembly."
)]
struct Cli {
    /// Changeset name to look up in every selected stack.
    #[arg(short = 'n', long = "name", env = "CDKREPORT_CHANGESET_NAME")]
    name: String,

    /// Stack names or prefixes to report; `*` selects every stack.
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    stacks: Vec<String>,

    /// More stack patterns, same meaning as --stacks.
    #[arg(value_name = "PATTERN")]
    patterns: Vec<String>,

    /// Cloud assembly directory produced by `cdk synth`.
    #[arg(long, default_value = DEFAULT_ASSEMBLY_DIR)]
    cloud_assembly_dir: Utf8PathBuf,

    /// Output format (text, markdown, json, yaml).
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Config file (default: ./cdkreport.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// AWS profile for the caller's own credentials.
    #[arg(long)]
    profile: Option<String>,

    /// Region for stacks whose environment does not name one.
    #[arg(long)]
    region: Option<String>,

    /// Log debug output from cdkreport to stderr.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let merged = match load_settings(&cli) {
        Ok(merged) => merged,
        Err(e) => {
            error!("{:?}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match real_main(cli, merged).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(EXIT_STACK_FAILURE)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,cdkreport=debug,cdkreport_core=debug,cdkreport_aws=debug,cdkreport_assembly=debug,cdkreport_render=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn load_settings(cli: &Cli) -> anyhow::Result<MergedConfig> {
    let file_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(Utf8Path::new(".")).context("load cdkreport.toml config")?,
    };

    let merged = ConfigMerger::new(file_config).merge(CliOverrides {
        profile: cli.profile.clone(),
        region: cli.region.clone(),
        format: cli.format,
    })?;

    debug!(
        "merged config: format={}, retry={:?}, aws={:?}",
        merged.format, merged.retry, merged.aws
    );
    Ok(merged)
}

async fn real_main(cli: Cli, merged: MergedConfig) -> anyhow::Result<u8> {
    let selection = StackSelection::from_patterns(cli.stacks.iter().chain(&cli.patterns).cloned());

    let settings = ReportSettings {
        assembly_dir: cli.cloud_assembly_dir,
        changeset_name: cli.name,
        selection,
        retry: merged.retry,
    };

    let stacks = match pipeline::select_stacks(&settings) {
        Ok(stacks) => stacks,
        Err(e) => {
            error!("{}", e);
            return Ok(e.exit_code());
        }
    };
    info!(
        count = stacks.len(),
        changeset = %settings.changeset_name,
        "selected stacks"
    );

    let base = load_base_config(&merged.aws).await;
    let default_region = merged
        .aws
        .default_region
        .clone()
        .or_else(|| base.region().map(|r| r.to_string()));
    let credentials = StsCredentialProvider::new(base.clone(), merged.aws.clone());
    let client = CloudFormationChangesetClient::new(base);
    let fetcher = ChangesetFetcher::new(&credentials, &client, settings.retry.clone())
        .with_default_region(default_region);

    let run = pipeline::gather(&fetcher, &stacks, &settings.changeset_name, tool_info()).await;

    let mut stdout = std::io::stdout().lock();
    write_report(&mut stdout, &run, merged.format).context("write report")?;

    Ok(pipeline::exit_code(&run))
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "cdkreport".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}
