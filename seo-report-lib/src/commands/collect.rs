//! The `run` command: one pass of the pipeline over a replayed dashboard session.

use super::Host;
use super::common::{LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::pipeline::{Orchestrator, ReplayExtractor, ReplaySession, RunSummary, SessionScope, StageOutcome, acquire_run_lock};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use clap::Parser;
use ohno::IntoAppError;
use std::fs;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file (default is `seo-report.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Directory holding the captured dashboard session to replay
    #[arg(long, value_name = "DIR")]
    pub capture: Utf8PathBuf,

    /// Exit with an error if any metric was skipped
    #[arg(long)]
    pub error_if_skipped: bool,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

pub async fn collect_metrics<H: Host>(host: &mut H, args: &RunArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;

    fs::create_dir_all(&config.report.directory)
        .into_app_err_with(|| format!("creating report directory '{}'", config.report.directory))?;
    fs::create_dir_all(&config.exports.download_directory)
        .into_app_err_with(|| format!("creating download directory '{}'", config.exports.download_directory))?;

    let _lock = acquire_run_lock(&config.report.directory).await?;

    let session = ReplaySession::load(&args.capture, &config.dashboard, config.exports.download_directory.clone())?;
    let mut scope = SessionScope::new(session);

    let orchestrator = Orchestrator::new(config.report, config.dashboard, config.exports);
    let result = orchestrator.run(&mut *scope, &mut ReplayExtractor, Local::now()).await;
    scope.release();

    let summary = result?;
    print_summary(host, &summary);

    if args.error_if_skipped && summary.skipped() > 0 {
        return Err(ohno::AppError::new(format!("{} metric(s) were skipped", summary.skipped())));
    }

    Ok(())
}

fn print_summary<H: Host>(host: &mut H, summary: &RunSummary) {
    let mut out = host.output();

    for metric in &summary.metrics {
        let _ = match &metric.outcome {
            StageOutcome::Completed { stored, rejected: 0 } => writeln!(out, "✅ {}: {stored} row(s) stored", metric.kind),
            StageOutcome::Completed { stored, rejected } => {
                writeln!(out, "✅ {}: {stored} row(s) stored, {rejected} rejected", metric.kind)
            }
            StageOutcome::Skipped(failure) => writeln!(
                out,
                "❌ {}: skipped at {} stage ({}): {}",
                metric.kind,
                failure.stage,
                failure.error.kind(),
                failure.error
            ),
        };
    }

    let _ = writeln!(out, "{} of {} metric(s) collected", summary.completed(), summary.metrics.len());
}
