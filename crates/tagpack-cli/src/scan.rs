//! Scan command - list the packages a repository provides.

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use console::Term;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use tagpack::cli::{ConsoleObserver, Output, ProgressManager, Verbosity};
use tagpack::config::{AuthConfig, VcsConfig};
use tagpack::{DriverContext, RepositoryLocation, ScanReport, TagpackError, VcsRepository};

use crate::config::TagpackConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Repository URL or local path
    #[arg(value_name = "URL")]
    pub url: String,

    /// Access method (github, gitlab, git); "vcs" picks one from the URL
    #[arg(long = "type", value_name = "METHOD")]
    pub vcs_type: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Do not show the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Working directory
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub async fn execute(args: ScanArgs, verbosity: Verbosity) -> Result<i32> {
    let working_dir = args
        .working_dir
        .canonicalize()
        .context("Failed to resolve working directory")?;

    let config = TagpackConfig::load(&working_dir)?.unwrap_or_default();

    let vcs_type = args
        .vcs_type
        .or(config.scan.vcs_type.clone())
        .unwrap_or_else(|| "vcs".to_string());
    let format = resolve_format(args.format, config.scan.format.as_deref())?;

    let mut auth = AuthConfig::build(Some(&working_dir)).context("Failed to load auth.json")?;
    for (host, token) in &config.auth.github_oauth {
        auth.set_github_oauth(host, token);
    }
    for (host, token) in &config.auth.gitlab_token {
        auth.set_gitlab_token(host, token);
    }
    let vcs_config = VcsConfig::build(true).context("Failed to load Composer config")?;

    let output = Output::new(verbosity);
    let show_progress = !args.no_progress && verbosity == Verbosity::Normal && Term::stderr().is_term();
    let progress = ProgressManager::new(show_progress);
    let observer = Arc::new(ConsoleObserver::new(Output::new(verbosity), &progress));

    let location = RepositoryLocation::new(args.url, vcs_type);
    log::debug!("Scanning {}", location);

    let repository = VcsRepository::new(location)
        .with_context(DriverContext::new(vcs_config, auth))
        .with_observer(observer);

    let result = tokio::task::spawn_blocking(move || repository.scan())
        .await
        .context("Scan task failed")?;

    let report = match result {
        Ok(report) => report,
        Err(e @ TagpackError::NoDriverFound { .. }) => {
            output.error(&e.to_string());
            return Ok(1);
        }
        Err(e) => return Err(e).context("Failed to scan repository"),
    };

    match format {
        OutputFormat::Text => {
            for line in text_lines(&report) {
                println!("{}", line);
            }
            print_summary(&output, &report);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_report(&report))?);
        }
    }

    Ok(0)
}

/// Flag wins over tagpack.toml, text is the fallback
fn resolve_format(flag: Option<OutputFormat>, configured: Option<&str>) -> Result<OutputFormat> {
    if let Some(format) = flag {
        return Ok(format);
    }

    match configured {
        None => Ok(OutputFormat::Text),
        Some(value) => match OutputFormat::from_str(value, true) {
            Ok(format) => Ok(format),
            Err(_) => bail!("Unknown output format \"{}\" in tagpack.toml", value),
        },
    }
}

fn text_lines(report: &ScanReport) -> Vec<String> {
    report
        .packages()
        .map(|package| {
            format!(
                "{} {} ({}) {}",
                package.pretty_name,
                package.version,
                package.version_normalized,
                package.reference().unwrap_or("-")
            )
        })
        .collect()
}

fn print_summary(output: &Output, report: &ScanReport) {
    output.write(&format!(
        "Imported {} package versions, skipped {}",
        report.imported.len(),
        report.skipped.len()
    ));

    if output.is_verbose() {
        for skipped in &report.skipped {
            output.list_item("-", &format!("{} {}: {}", skipped.kind, skipped.name, skipped.reason));
        }
    }
}

fn json_report(report: &ScanReport) -> serde_json::Value {
    let skipped: Vec<serde_json::Value> = report
        .skipped
        .iter()
        .map(|s| {
            json!({
                "kind": s.kind,
                "name": s.name,
                "reason": s.reason.to_string(),
            })
        })
        .collect();

    json!({
        "packages": report.packages().collect::<Vec<_>>(),
        "skipped": skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagpack::package::Source;
    use tagpack::repository::vcs::{ItemOutcome, RefKind, SkipReason};
    use tagpack::Package;

    fn sample_report() -> ScanReport {
        let mut package = Package::new("Acme/Widget", "1.0.0", "1.0.0.0");
        package.source = Some(Source::git("https://example.org/acme/widget.git", "abc123"));

        ScanReport::new(Some("Acme/Widget".to_string()))
            .record(ItemOutcome {
                kind: RefKind::Tag,
                name: "1.0.0".to_string(),
                identifier: "abc123".to_string(),
                result: Ok(package),
            })
            .record(ItemOutcome {
                kind: RefKind::Branch,
                name: "docs".to_string(),
                identifier: "def456".to_string(),
                result: Err(SkipReason::NoComposerFile),
            })
    }

    #[test]
    fn test_format_flag_overrides_config() {
        assert_eq!(resolve_format(Some(OutputFormat::Text), Some("json")).unwrap(), OutputFormat::Text);
        assert_eq!(resolve_format(None, Some("JSON")).unwrap(), OutputFormat::Json);
        assert_eq!(resolve_format(None, None).unwrap(), OutputFormat::Text);
        assert!(resolve_format(None, Some("yaml")).is_err());
    }

    #[test]
    fn test_text_lines() {
        assert_eq!(
            text_lines(&sample_report()),
            vec!["Acme/Widget 1.0.0 (1.0.0.0) abc123".to_string()]
        );
    }

    #[test]
    fn test_json_report() {
        let value = json_report(&sample_report());

        assert_eq!(value["packages"][0]["name"], "Acme/Widget");
        assert_eq!(value["packages"][0]["version_normalized"], "1.0.0.0");
        assert_eq!(value["packages"][0]["source"]["reference"], "abc123");
        assert_eq!(value["skipped"][0]["kind"], "branch");
        assert_eq!(value["skipped"][0]["reason"], "no composer file was found");
    }
}
