//! Rendering helpers for changeset reports.

mod markdown;
mod text;

pub use markdown::{render_failures_md, render_markdown, truncate_middle};
pub use text::{format_failure, format_result};

use cdkreport_types::report::ReportRun;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!(
                "unknown output format '{other}' (expected text, markdown, json or yaml)"
            )),
        }
    }
}

pub fn render_json(run: &ReportRun) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(run)?;
    out.push('\n');
    Ok(out)
}

pub fn render_yaml(run: &ReportRun) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(run)
}

/// Write every result in order, followed by a summary of failed stacks.
///
/// Per-stack failures are part of the report; only I/O and serialization
/// errors are returned.
pub fn write_report<W: Write>(
    writer: &mut W,
    run: &ReportRun,
    format: OutputFormat,
) -> io::Result<()> {
    debug!(
        format = %format,
        results = run.results.len(),
        failures = run.failures.len(),
        "writing report"
    );

    match format {
        OutputFormat::Text => {
            for result in &run.results {
                writer.write_all(format_result(result).as_bytes())?;
            }
            if !run.failures.is_empty() {
                writeln!(writer)?;
                writeln!(writer, "{} stack(s) could not be reported:", run.failures.len())?;
                for failure in &run.failures {
                    writer.write_all(format_failure(failure).as_bytes())?;
                }
            }
        }
        OutputFormat::Markdown => {
            for result in &run.results {
                writer.write_all(render_markdown(result).as_bytes())?;
            }
            if !run.failures.is_empty() {
                writer.write_all(render_failures_md(&run.failures).as_bytes())?;
            }
        }
        OutputFormat::Json => {
            let doc = render_json(run).map_err(io::Error::other)?;
            writer.write_all(doc.as_bytes())?;
        }
        OutputFormat::Yaml => {
            let doc = render_yaml(run).map_err(io::Error::other)?;
            writer.write_all(doc.as_bytes())?;
        }
    }

    writer.flush()
}
