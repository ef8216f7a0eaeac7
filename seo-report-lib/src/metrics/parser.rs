use super::{
    BrokenLinkRecord, IndexedPageSnapshot, MetricRecord, PagePerformanceRow, ParseError, ParseFailure, QueryPerformanceRow, RawRecord,
    TotalClicksSnapshot,
};
use crate::store::Cell;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

const INDEXED_COUNT: &str = "Indexed Count";
const LAST_UPDATED: &str = "Last Updated";
const TOTAL_CLICKS: &str = "Total Clicks";
const URL: &str = "URL";
const LAST_CRAWLED: &str = "Last crawled";
const TOP_QUERIES: &str = "Top queries";
const TOP_PAGES: &str = "Top pages";
const CLICKS: &str = "Clicks";
const IMPRESSIONS: &str = "Impressions";
const CTR: &str = "CTR";
const POSITION: &str = "Position";

static DASHBOARD_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2}\b").expect("invalid date regex"));

/// Rows that survived validation plus the errors for the ones that did not.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBatch<T> {
    pub records: Vec<T>,
    pub rejected: Vec<ParseError>,
}

impl<T> Default for ParsedBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T: Into<MetricRecord>> ParsedBatch<T> {
    /// Erases the row type so batches of different metrics can be stored uniformly.
    #[must_use]
    pub fn into_metric_records(self) -> ParsedBatch<MetricRecord> {
        ParsedBatch {
            records: self.records.into_iter().map(Into::into).collect(),
            rejected: self.rejected,
        }
    }
}

impl<T> FromIterator<Result<T, ParseError>> for ParsedBatch<T> {
    fn from_iter<I: IntoIterator<Item = Result<T, ParseError>>>(iter: I) -> Self {
        let mut batch = Self::default();
        for item in iter {
            match item {
                Ok(record) => batch.records.push(record),
                Err(e) => batch.rejected.push(e),
            }
        }
        batch
    }
}

/// Returns `true` if `s` parses as a URL with both a non-empty scheme and a non-empty host.
#[must_use]
pub fn is_valid_url(s: &str) -> bool {
    Url::parse(s.trim()).is_ok_and(|url| !url.scheme().is_empty() && url.host_str().is_some_and(|host| !host.is_empty()))
}

/// Keeps only the entries of `urls` that pass [`is_valid_url`], preserving order.
pub fn validate_urls<'a>(urls: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    urls.into_iter().filter(|url| is_valid_url(url)).collect()
}

/// Normalizes the indexed-pages overview record.
///
/// `Indexed Count` is mandatory. `Last Updated` is optional and passed through as trimmed text.
/// When the field is a label around an `M/D/YY` date (`Last updated: 3/4/24`), only the date is
/// kept; any other text is kept verbatim.
pub fn parse_indexed_pages(raw: &RawRecord) -> Result<IndexedPageSnapshot, ParseError> {
    let indexed_count = parse_count(INDEXED_COUNT, raw.get(INDEXED_COUNT))?;
    let last_updated = raw
        .get(LAST_UPDATED)
        .map(ToString::to_string)
        .map(|text| {
            let text = text.trim();
            find_dashboard_date(text).unwrap_or(text).to_string()
        })
        .filter(|text| !text.is_empty());

    Ok(IndexedPageSnapshot {
        last_updated,
        indexed_count,
    })
}

/// Normalizes the total-clicks record, stamping it with the run date `date`.
pub fn parse_total_clicks(raw: &RawRecord, date: impl Into<String>) -> Result<TotalClicksSnapshot, ParseError> {
    Ok(TotalClicksSnapshot {
        date: date.into(),
        total_clicks: parse_count(TOTAL_CLICKS, raw.get(TOTAL_CLICKS))?,
    })
}

/// Normalizes the rows of a broken-link export, dropping rows whose URL is missing or invalid.
pub fn parse_broken_links(rows: impl IntoIterator<Item = RawRecord>) -> ParsedBatch<BrokenLinkRecord> {
    rows.into_iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            Ok(BrokenLinkRecord {
                url: parse_url(URL, row.get(URL))?,
                last_crawled: row.get(LAST_CRAWLED).filter(|cell| !cell.is_empty()).map(ToString::to_string),
            })
        })
        .collect()
}

/// Normalizes the rows of the query breakdown of a performance export.
pub fn parse_query_rows(rows: impl IntoIterator<Item = RawRecord>) -> ParsedBatch<QueryPerformanceRow> {
    rows.into_iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let query = parse_text(TOP_QUERIES, row.get(TOP_QUERIES))?;
            let stats = parse_performance(&row)?;
            Ok(QueryPerformanceRow {
                query,
                clicks: stats.clicks,
                impressions: stats.impressions,
                ctr: stats.ctr,
                position: stats.position,
            })
        })
        .collect()
}

/// Normalizes the rows of the page breakdown of a performance export.
pub fn parse_page_rows(rows: impl IntoIterator<Item = RawRecord>) -> ParsedBatch<PagePerformanceRow> {
    rows.into_iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let page = parse_url(TOP_PAGES, row.get(TOP_PAGES))?;
            let stats = parse_performance(&row)?;
            Ok(PagePerformanceRow {
                page,
                clicks: stats.clicks,
                impressions: stats.impressions,
                ctr: stats.ctr,
                position: stats.position,
            })
        })
        .collect()
}

struct PerformanceStats {
    clicks: u64,
    impressions: u64,
    ctr: f64,
    position: f64,
}

fn parse_performance(row: &RawRecord) -> Result<PerformanceStats, ParseError> {
    Ok(PerformanceStats {
        clicks: parse_count(CLICKS, row.get(CLICKS))?,
        impressions: parse_count(IMPRESSIONS, row.get(IMPRESSIONS))?,
        ctr: parse_ctr(CTR, row.get(CTR))?,
        position: parse_decimal(POSITION, row.get(POSITION))?,
    })
}

fn present<'a>(field: &str, cell: Option<&'a Cell>) -> Result<&'a Cell, ParseError> {
    match cell {
        Some(cell) if !cell.is_empty() => Ok(cell),
        _ => Err(ParseError::missing(field)),
    }
}

fn parse_text(field: &str, cell: Option<&Cell>) -> Result<String, ParseError> {
    let text = present(field, cell)?.to_string();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::missing(field));
    }
    Ok(trimmed.to_string())
}

fn parse_url(field: &str, cell: Option<&Cell>) -> Result<String, ParseError> {
    let text = parse_text(field, cell)?;
    if is_valid_url(&text) {
        Ok(text)
    } else {
        Err(ParseError::new(field, text, ParseFailure::InvalidUrl))
    }
}

/// Parses a non-negative integer, accepting numeric cells and text with thousands separators.
fn parse_count(field: &str, cell: Option<&Cell>) -> Result<u64, ParseError> {
    match present(field, cell)? {
        Cell::Number(n) => {
            if *n < 0.0 {
                Err(ParseError::new(field, n.to_string(), ParseFailure::Negative))
            } else if n.is_finite() && n.fract() == 0.0 && *n <= MAX_EXACT_INTEGER {
                Ok(integral_to_u64(*n))
            } else {
                Err(ParseError::new(field, n.to_string(), ParseFailure::NotANumber))
            }
        }
        other => {
            let text = other.to_string();
            let digits = strip_separators(&text);
            if digits.starts_with('-') {
                return Err(ParseError::new(field, text, ParseFailure::Negative));
            }
            digits.parse::<u64>().map_err(|_| ParseError::new(field, text, ParseFailure::NotANumber))
        }
    }
}

const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "callers check the value is integral, non-negative and in range")]
fn integral_to_u64(n: f64) -> u64 {
    n as u64
}

fn parse_decimal(field: &str, cell: Option<&Cell>) -> Result<f64, ParseError> {
    let value = match present(field, cell)? {
        Cell::Number(n) => *n,
        other => {
            let text = other.to_string();
            strip_separators(&text)
                .parse::<f64>()
                .map_err(|_| ParseError::new(field, text.clone(), ParseFailure::NotANumber))?
        }
    };
    non_negative(field, value)
}

/// Click-through rate as a fraction; text of the form `1.23%` is divided by 100.
fn parse_ctr(field: &str, cell: Option<&Cell>) -> Result<f64, ParseError> {
    let value = match present(field, cell)? {
        Cell::Number(n) => *n,
        other => {
            let text = other.to_string();
            let trimmed = text.trim();
            let (number, scale) = trimmed.strip_suffix('%').map_or((trimmed, 1.0), |number| (number, 100.0));
            strip_separators(number)
                .parse::<f64>()
                .map(|n| n / scale)
                .map_err(|_| ParseError::new(field, text.clone(), ParseFailure::NotANumber))?
        }
    };
    non_negative(field, value)
}

fn non_negative(field: &str, value: f64) -> Result<f64, ParseError> {
    if !value.is_finite() {
        Err(ParseError::new(field, value.to_string(), ParseFailure::NotANumber))
    } else if value < 0.0 {
        Err(ParseError::new(field, value.to_string(), ParseFailure::Negative))
    } else {
        Ok(value)
    }
}

fn strip_separators(text: &str) -> String {
    text.trim().chars().filter(|c| *c != ',' && *c != '\u{a0}').collect()
}

fn find_dashboard_date(text: &str) -> Option<&str> {
    let date = DASHBOARD_DATE.find(text)?.as_str();
    NaiveDate::parse_from_str(date, "%m/%d/%y").ok().map(|_| date)
}
