//! Drives a run: dashboard session, extraction, export waiting, parsing and storage
//!
//! # Implementation Model
//!
//! The dashboard is reached through two traits so the pipeline never depends on a concrete
//! browser: [`PageSession`] navigates, waits for elements and triggers exports, and
//! [`PageExtractor`] reads the fields of page-backed metrics. [`SessionScope`] owns the session
//! for a run and guarantees it is released exactly once.
//!
//! [`Orchestrator::run`] walks every [`MetricKind`](crate::metrics::MetricKind) in order:
//!
//! 1. **Extract**: open the metric's page, then read its fields or start its export
//! 2. **Wait**: for exported metrics, wait for the artifact in the download directory
//! 3. **Parse**: turn raw fields or export rows into typed records
//! 4. **Store**: append the records to the metric's sheet
//! 5. **Merge**: for staged metrics, copy the per-metric sheet into the consolidated report
//!
//! A failing stage skips the rest of that metric only; the outcome of each metric is
//! collected in a [`RunSummary`]. [`ReplaySession`] implements the session traits over a
//! capture stored on disk.

mod orchestrator;
mod replay;
mod run_lock;
mod session;
mod settings;
mod stage;

pub use orchestrator::Orchestrator;
pub use replay::{CAPTURE_FILE_NAME, Capture, CapturedExport, CapturedPage, ReplayExtractor, ReplaySession};
pub use run_lock::{LOCK_FILE_NAME, RunLockGuard, acquire_run_lock};
pub use session::{ElementState, PageExtractor, PageSession, SessionScope};
pub use settings::{
    BROKEN_LINKS_REPORT_SHEET, DashboardSettings, ExportSettings, INDEXED_DATA_SHEET, INDEXED_PAGES_REPORT_SHEET, MetricTarget,
    PAGES_REPORT_SHEET, QUERIES_REPORT_SHEET, ReportSettings, TOTAL_CLICKS_REPORT_SHEET, TOTAL_CLICKS_SHEET,
};
pub use stage::{MetricReport, RunSummary, Stage, StageFailure, StageOutcome};
