//! Waiting for asynchronously produced export artifacts
//!
//! After the dashboard has been asked to export a report, the file shows up in a download
//! directory some time later. [`ExportWaiter`] polls that directory at a fixed interval for a
//! file matching an [`ExportJob`], giving up once the job's time budget is spent.

mod export_job;
mod waiter;

pub use export_job::{ArtifactSelection, ExportJob};
pub use waiter::ExportWaiter;
