#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for seo-report
//!
//! This library consolidates all functionality for the seo-report tool, which collects a fixed
//! set of search-console metrics and folds them into a multi-sheet spreadsheet report.
//!
//! # Module Organization
//!
//! - [`metrics`]: Metric kinds, typed records, and parsing of raw extracted records
//! - [`export`]: Waiting for asynchronously produced export artifacts
//! - [`store`]: Workbook storage, sheet consolidation, and the xlsx codec
//! - [`pipeline`]: Session traits and the orchestrator that drives one run
//! - [`commands`]: Command-line interface

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

mod error;
pub mod export;
pub mod metrics;
pub mod pipeline;
pub mod store;

pub use crate::commands::{Host, run};
pub use crate::error::{ErrorKind, ReportError};
