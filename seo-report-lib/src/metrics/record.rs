use super::MetricKind;
use crate::store::Cell;

/// Indexed-page count as shown on the dashboard overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPageSnapshot {
    /// Date text as the dashboard shows it (for example `3/4/24`), if any.
    pub last_updated: Option<String>,
    pub indexed_count: u64,
}

/// A URL reported as not found, with the date it was last crawled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLinkRecord {
    /// Absolute URL, validated to carry a scheme and a host.
    pub url: String,
    pub last_crawled: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPerformanceRow {
    pub query: String,
    pub clicks: u64,
    pub impressions: u64,
    /// Click-through rate as a fraction (`0.0123` for 1.23%).
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePerformanceRow {
    /// Absolute URL, validated to carry a scheme and a host.
    pub page: String,
    pub clicks: u64,
    pub impressions: u64,
    /// Click-through rate as a fraction (`0.0123` for 1.23%).
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalClicksSnapshot {
    /// Date the snapshot was taken, already formatted for the report.
    pub date: String,
    pub total_clicks: u64,
}

/// A validated metric, one variant per [`MetricKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetricRecord {
    IndexedPages(IndexedPageSnapshot),
    BrokenLink(BrokenLinkRecord),
    QueryPerformance(QueryPerformanceRow),
    PagePerformance(PagePerformanceRow),
    TotalClicks(TotalClicksSnapshot),
}

impl MetricRecord {
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        match self {
            Self::IndexedPages(_) => MetricKind::IndexedPages,
            Self::BrokenLink(_) => MetricKind::BrokenLinks,
            Self::QueryPerformance(_) => MetricKind::QueryPerformance,
            Self::PagePerformance(_) => MetricKind::PagePerformance,
            Self::TotalClicks(_) => MetricKind::TotalClicks,
        }
    }

    /// Cells of this record in the column order of [`MetricKind::header`].
    #[must_use]
    pub fn to_row(&self) -> Vec<Cell> {
        match self {
            Self::IndexedPages(r) => vec![optional_text(r.last_updated.as_deref()), Cell::from(r.indexed_count)],
            Self::BrokenLink(r) => vec![Cell::from(r.url.as_str()), optional_text(r.last_crawled.as_deref())],
            Self::QueryPerformance(r) => vec![
                Cell::from(r.query.as_str()),
                Cell::from(r.clicks),
                Cell::from(r.impressions),
                Cell::Number(r.ctr),
                Cell::Number(r.position),
            ],
            Self::PagePerformance(r) => vec![
                Cell::from(r.page.as_str()),
                Cell::from(r.clicks),
                Cell::from(r.impressions),
                Cell::Number(r.ctr),
                Cell::Number(r.position),
            ],
            Self::TotalClicks(r) => vec![Cell::from(r.date.as_str()), Cell::from(r.total_clicks)],
        }
    }
}

fn optional_text(text: Option<&str>) -> Cell {
    text.map_or(Cell::Empty, Cell::from)
}

impl From<IndexedPageSnapshot> for MetricRecord {
    fn from(value: IndexedPageSnapshot) -> Self {
        Self::IndexedPages(value)
    }
}

impl From<BrokenLinkRecord> for MetricRecord {
    fn from(value: BrokenLinkRecord) -> Self {
        Self::BrokenLink(value)
    }
}

impl From<QueryPerformanceRow> for MetricRecord {
    fn from(value: QueryPerformanceRow) -> Self {
        Self::QueryPerformance(value)
    }
}

impl From<PagePerformanceRow> for MetricRecord {
    fn from(value: PagePerformanceRow) -> Self {
        Self::PagePerformance(value)
    }
}

impl From<TotalClicksSnapshot> for MetricRecord {
    fn from(value: TotalClicksSnapshot) -> Self {
        Self::TotalClicks(value)
    }
}
