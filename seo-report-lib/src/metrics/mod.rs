//! Metric kinds, typed metric records, and the parsing that produces them
//!
//! The dashboard collaborators hand back loosely-typed [`RawRecord`]s: a mapping from field
//! name to [`Cell`](crate::store::Cell). This module is the single boundary where those maps
//! are validated and normalized into [`MetricRecord`] variants; nothing downstream sees an
//! untyped record.
//!
//! # Implementation Model
//!
//! - [`MetricKind`] enumerates the fixed set of metrics, in the order a run processes them,
//!   and knows the header of the sheet its records are written to.
//! - The `parse_*` functions are pure: no logging, no filesystem, no network. Single-record
//!   metrics return `Result<_, ParseError>`; tabular metrics return a [`ParsedBatch`] that
//!   keeps the valid rows and reports the rejected ones instead of failing the whole batch.

mod metric_kind;
mod parse_error;
mod parser;
mod raw_record;
mod record;

pub use metric_kind::{MetricKind, MetricSource};
pub use parse_error::{ParseError, ParseFailure};
pub use parser::{
    ParsedBatch, is_valid_url, parse_broken_links, parse_indexed_pages, parse_page_rows, parse_query_rows, parse_total_clicks,
    validate_urls,
};
pub use raw_record::RawRecord;
pub use record::{BrokenLinkRecord, IndexedPageSnapshot, MetricRecord, PagePerformanceRow, QueryPerformanceRow, TotalClicksSnapshot};
