//! Collect search-console metrics into a consolidated spreadsheet report.
//!
//! # Overview
//!
//! `seo-report` walks a fixed set of dashboard metrics (indexed pages, broken links, query
//! performance, page performance and total clicks), validates what it reads, and appends it to
//! a multi-sheet xlsx report that grows with every run.
//!
//! # Quick Start
//!
//! Generate a configuration file and adjust it to your property:
//!
//! ```bash
//! seo-report init
//! seo-report validate
//! ```
//!
//! Run the pipeline over a captured dashboard session:
//!
//! ```bash
//! seo-report run --capture captures/2026-10
//! ```
//!
//! Copy a sheet between workbooks by hand:
//!
//! ```bash
//! seo-report merge reports/Indexed_Pages.xlsx "Indexed Data" reports/Monthly_SEO_Metrics.xlsx --as "Indexed Pages"
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use seo_report_lib::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that runs real OS commands.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
