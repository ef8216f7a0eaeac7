use super::session::{ElementState, PageExtractor, PageSession};
use super::settings::{DashboardSettings, ExportSettings, MetricTarget, ReportSettings};
use super::stage::{MetricReport, RunSummary, Stage, StageFailure, StageOutcome};
use crate::Result;
use crate::error::{ErrorKind, ReportError};
use crate::export::{ExportJob, ExportWaiter};
use crate::metrics::{
    MetricKind, MetricRecord, MetricSource, ParsedBatch, RawRecord, parse_broken_links, parse_indexed_pages, parse_page_rows,
    parse_query_rows, parse_total_clicks,
};
use crate::store::{ReportStore, xlsx};
use camino::Utf8Path;
use chrono::{DateTime, Local};
use core::fmt::Write;
use ohno::IntoAppError;
use std::fs;
use strum::IntoEnumIterator;

const LOG_TARGET: &str = "orchestrator";

/// Drives one run: every metric kind, in order, from the dashboard into the report.
///
/// A failure while handling one metric is logged and recorded in the [`RunSummary`], and the
/// run moves on to the next metric. Only a failure to save the consolidated report at the end
/// of the run fails the run as a whole.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    report: ReportSettings,
    dashboard: DashboardSettings,
    exports: ExportSettings,
    store: ReportStore,
    waiter: ExportWaiter,
}

impl Orchestrator {
    #[must_use]
    pub fn new(report: ReportSettings, dashboard: DashboardSettings, exports: ExportSettings) -> Self {
        let waiter = ExportWaiter::new(exports.selection);
        Self {
            report,
            dashboard,
            exports,
            store: ReportStore::new(),
            waiter,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: ReportStore) -> Self {
        self.store = store;
        self
    }

    /// Runs the whole pipeline once, stamping date-keyed snapshots with `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured date format is invalid or the consolidated report
    /// cannot be saved at the end of the run.
    pub async fn run<S, E>(&self, session: &mut S, extractor: &mut E, now: DateTime<Local>) -> Result<RunSummary>
    where
        S: PageSession,
        E: PageExtractor<S>,
    {
        let stamp = format_date(now, &self.report.date_format)?;
        let mut summary = RunSummary::default();

        for kind in MetricKind::iter() {
            log::info!(target: LOG_TARGET, "Collecting {kind}");

            let outcome = match self.run_metric(session, extractor, kind, &stamp).await {
                Ok((stored, rejected)) => {
                    log::info!(target: LOG_TARGET, "Stored {stored} {kind} row(s), rejected {rejected}");
                    StageOutcome::Completed { stored, rejected }
                }
                Err(failure) => {
                    log::error!(
                        target: LOG_TARGET,
                        "Skipping {kind}: {} stage failed with {}: {}",
                        failure.stage,
                        failure.error.kind(),
                        failure.error
                    );

                    if matches!(failure.error.kind(), ErrorKind::ExtractionError | ErrorKind::ExportTimeout) {
                        let label = format!("{}-{}", kind.to_string().replace(' ', "_"), failure.stage);
                        if let Err(e) = session.save_diagnostics(&label).await {
                            log::warn!(target: LOG_TARGET, "Could not save diagnostics '{label}': {e:#}");
                        }
                    }

                    StageOutcome::Skipped(failure)
                }
            };

            summary.metrics.push(MetricReport { kind, outcome });
        }

        let consolidated = self.report.consolidated_path();
        self.store
            .finalize(&consolidated)
            .into_app_err_with(|| format!("saving consolidated report '{consolidated}'"))?;

        log::info!(
            target: LOG_TARGET,
            "Run finished: {} metric(s) collected, {} skipped",
            summary.completed(),
            summary.skipped()
        );

        Ok(summary)
    }

    async fn run_metric<S, E>(&self, session: &mut S, extractor: &mut E, kind: MetricKind, stamp: &str) -> Result<(usize, usize), StageFailure>
    where
        S: PageSession,
        E: PageExtractor<S>,
    {
        let url = self
            .dashboard
            .page_url(kind)
            .map_err(|e| extraction_failure(kind, format!("invalid dashboard URL '{}': {e}", self.dashboard.base_url)))?;

        session
            .navigate(&url)
            .await
            .map_err(|e| extraction_failure(kind, format!("could not open '{url}': {e:#}")))?;

        match self.exports.job_for(kind) {
            Some(job) => self.collect_from_export(session, kind, job).await,
            None => self.collect_from_page(session, extractor, kind, stamp).await,
        }
    }

    async fn collect_from_page<S, E>(&self, session: &mut S, extractor: &mut E, kind: MetricKind, stamp: &str) -> Result<(usize, usize), StageFailure>
    where
        S: PageSession,
        E: PageExtractor<S>,
    {
        session
            .wait_for_element(&self.dashboard.page_ready, self.dashboard.page_load_timeout, ElementState::Present)
            .await
            .map_err(|e| extraction_failure(kind, format!("page did not finish loading: {e:#}")))?;

        let raw = extractor
            .extract(session, kind)
            .await
            .map_err(|e| extraction_failure(kind, format!("{e:#}")))?;

        let record = parse_page_record(kind, &raw, stamp)?;
        let stored = self.store_records(kind, core::slice::from_ref(&record))?;
        Ok((stored, 0))
    }

    async fn collect_from_export<S>(&self, session: &mut S, kind: MetricKind, job: ExportJob) -> Result<(usize, usize), StageFailure>
    where
        S: PageSession,
    {
        session
            .wait_for_element(&self.dashboard.export_button, self.dashboard.page_load_timeout, ElementState::Present)
            .await
            .map_err(|e| extraction_failure(kind, format!("export button not found: {e:#}")))?;

        session
            .trigger_export()
            .await
            .map_err(|e| extraction_failure(kind, format!("could not start export: {e:#}")))?;

        let artifact = self.waiter.wait(job).await.map_err(|e| StageFailure::new(Stage::Wait, e))?;

        // A file left behind would match the prefix of the next export.
        let rows = read_artifact(&artifact, kind);
        if let Err(e) = fs::remove_file(&artifact) {
            log::warn!(target: LOG_TARGET, "Could not delete export '{artifact}': {e}");
        }

        let rows = rows.map_err(|e| StageFailure::new(Stage::Extract, e))?;
        let batch = parse_export_rows(kind, rows)?;

        for rejected in &batch.rejected {
            log::warn!(target: LOG_TARGET, "Dropped {kind} row: {rejected}");
        }

        let stored = self.store_records(kind, &batch.records)?;
        Ok((stored, batch.rejected.len()))
    }

    fn store_records(&self, kind: MetricKind, records: &[MetricRecord]) -> Result<usize, StageFailure> {
        let consolidated = self.report.consolidated_path();

        match self.report.target(kind) {
            MetricTarget::Direct { report_sheet } => self
                .store
                .append_records(&consolidated, report_sheet, kind.header(), records)
                .map_err(|e| StageFailure::new(Stage::Store, e)),

            MetricTarget::Staged {
                workbook,
                sheet,
                report_sheet,
            } => {
                let stored = self
                    .store
                    .append_records(&workbook, sheet, kind.header(), records)
                    .map_err(|e| StageFailure::new(Stage::Store, e))?;

                // The staged workbook holds the full history, so the report sheet mirrors it.
                let _ = self
                    .store
                    .mirror_sheet(&workbook, sheet, &consolidated, report_sheet)
                    .map_err(|e| StageFailure::new(Stage::Merge, e))?;

                Ok(stored)
            }
        }
    }
}

fn extraction_failure(kind: MetricKind, reason: impl Into<String>) -> StageFailure {
    StageFailure::new(Stage::Extract, ReportError::Extraction { kind, reason: reason.into() })
}

fn parse_page_record(kind: MetricKind, raw: &RawRecord, stamp: &str) -> Result<MetricRecord, StageFailure> {
    let parsed = match kind {
        MetricKind::IndexedPages => parse_indexed_pages(raw).map(MetricRecord::from),
        MetricKind::TotalClicks => parse_total_clicks(raw, stamp).map(MetricRecord::from),
        MetricKind::BrokenLinks | MetricKind::QueryPerformance | MetricKind::PagePerformance => {
            return Err(extraction_failure(kind, "is not read from the dashboard page"));
        }
    };

    parsed.map_err(|e| StageFailure::new(Stage::Parse, e.into()))
}

fn parse_export_rows(kind: MetricKind, rows: Vec<RawRecord>) -> Result<ParsedBatch<MetricRecord>, StageFailure> {
    match kind {
        MetricKind::BrokenLinks => Ok(parse_broken_links(rows).into_metric_records()),
        MetricKind::QueryPerformance => Ok(parse_query_rows(rows).into_metric_records()),
        MetricKind::PagePerformance => Ok(parse_page_rows(rows).into_metric_records()),
        MetricKind::IndexedPages | MetricKind::TotalClicks => Err(extraction_failure(kind, "has no export")),
    }
}

/// Reads the rows of an export artifact, keyed by the artifact's header row.
fn read_artifact(path: &Utf8Path, kind: MetricKind) -> Result<Vec<RawRecord>, ReportError> {
    let MetricSource::Export { sheet: sheet_name } = kind.source() else {
        return Err(ReportError::Extraction {
            kind,
            reason: "has no export".into(),
        });
    };

    let sheets = xlsx::read_sheets(path).map_err(|e| ReportError::Extraction {
        kind,
        reason: format!("could not read export '{path}': {e}"),
    })?;

    let sheet = sheets.iter().find(|s| s.name() == sheet_name).ok_or_else(|| ReportError::Extraction {
        kind,
        reason: format!("export '{path}' has no '{sheet_name}' sheet"),
    })?;

    let header = sheet.header_cells();
    Ok(sheet.rows().iter().map(|row| RawRecord::from_row(&header, row)).collect())
}

fn format_date(now: DateTime<Local>, format: &str) -> Result<String> {
    let mut text = String::new();
    write!(text, "{}", now.format(format)).into_app_err_with(|| format!("invalid date format '{format}'"))?;
    Ok(text)
}
