use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// The fixed categories of search data collected by a run.
///
/// Variants are declared in processing order; [`strum::IntoEnumIterator::iter`] yields them
/// in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, IntoStaticStr, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    #[strum(to_string = "indexed pages")]
    IndexedPages,

    #[strum(to_string = "broken links")]
    BrokenLinks,

    #[strum(to_string = "query performance")]
    QueryPerformance,

    #[strum(to_string = "page performance")]
    PagePerformance,

    #[strum(to_string = "total clicks")]
    TotalClicks,
}

/// Where the raw data for a metric comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Read directly off the dashboard page.
    Page,

    /// Downloaded as a spreadsheet export; rows are read from the named sheet of the artifact.
    Export { sheet: &'static str },
}

const INDEXED_PAGES_HEADER: &[&str] = &["Last Updated", "Indexed Count"];
const BROKEN_LINKS_HEADER: &[&str] = &["URL", "Last Crawled"];
const QUERY_PERFORMANCE_HEADER: &[&str] = &["Top queries", "Clicks", "Impressions", "CTR", "Position"];
const PAGE_PERFORMANCE_HEADER: &[&str] = &["Top pages", "Clicks", "Impressions", "CTR", "Position"];
const TOTAL_CLICKS_HEADER: &[&str] = &["Last Updated", "Total Clicks"];

impl MetricKind {
    #[must_use]
    pub const fn source(self) -> MetricSource {
        match self {
            Self::IndexedPages | Self::TotalClicks => MetricSource::Page,
            Self::BrokenLinks => MetricSource::Export { sheet: "Table" },
            Self::QueryPerformance => MetricSource::Export { sheet: "Queries" },
            Self::PagePerformance => MetricSource::Export { sheet: "Pages" },
        }
    }

    /// Column names of the sheet this metric's records are written to.
    #[must_use]
    pub const fn header(self) -> &'static [&'static str] {
        match self {
            Self::IndexedPages => INDEXED_PAGES_HEADER,
            Self::BrokenLinks => BROKEN_LINKS_HEADER,
            Self::QueryPerformance => QUERY_PERFORMANCE_HEADER,
            Self::PagePerformance => PAGE_PERFORMANCE_HEADER,
            Self::TotalClicks => TOTAL_CLICKS_HEADER,
        }
    }

    #[must_use]
    pub const fn is_exported(self) -> bool {
        matches!(self.source(), MetricSource::Export { .. })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_processing_order() {
        let order: Vec<_> = MetricKind::iter().collect();
        assert_eq!(
            order,
            [
                MetricKind::IndexedPages,
                MetricKind::BrokenLinks,
                MetricKind::QueryPerformance,
                MetricKind::PagePerformance,
                MetricKind::TotalClicks,
            ]
        );
    }

    #[test]
    fn test_headers_are_fixed() {
        assert_eq!(MetricKind::IndexedPages.header(), ["Last Updated", "Indexed Count"]);
        assert_eq!(MetricKind::BrokenLinks.header(), ["URL", "Last Crawled"]);
        assert_eq!(MetricKind::QueryPerformance.header(), ["Top queries", "Clicks", "Impressions", "CTR", "Position"]);
        assert_eq!(MetricKind::PagePerformance.header(), ["Top pages", "Clicks", "Impressions", "CTR", "Position"]);
        assert_eq!(MetricKind::TotalClicks.header(), ["Last Updated", "Total Clicks"]);
    }

    #[test]
    fn test_exported_kinds() {
        let exported: Vec<_> = MetricKind::iter().filter(|k| k.is_exported()).collect();
        assert_eq!(exported, [MetricKind::BrokenLinks, MetricKind::QueryPerformance, MetricKind::PagePerformance]);
    }

    #[test]
    fn test_display_and_serde_names() {
        assert_eq!(MetricKind::BrokenLinks.to_string(), "broken links");
        let parsed: MetricKind = serde_json::from_str("\"page_performance\"").unwrap();
        assert_eq!(parsed, MetricKind::PagePerformance);
    }
}
