//! Workbook storage and consolidation
//!
//! A [`Workbook`] is a set of named [`Sheet`]s bound to a file path. [`ReportStore`] owns
//! every workbook of a report: it opens or creates them, appends metric records, copies
//! sheets from one workbook into another, and persists after every mutation.
//!
//! Documents are stored as xlsx. They are read with `calamine` and written with
//! `rust_xlsxwriter`.

mod cell;
mod report_store;
mod sheet;
mod workbook;
pub mod xlsx;

pub use cell::Cell;
pub use report_store::{ReportStore, WORKBOOK_AUTHOR};
pub use sheet::Sheet;
pub use workbook::{PLACEHOLDER_SHEET, Workbook, WorkbookState};
