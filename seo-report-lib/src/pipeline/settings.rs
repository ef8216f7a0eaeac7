use crate::export::{ArtifactSelection, ExportJob};
use crate::metrics::MetricKind;
use camino::Utf8PathBuf;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use url::Url;

pub const INDEXED_DATA_SHEET: &str = "Indexed Data";
pub const TOTAL_CLICKS_SHEET: &str = "Total Clicks";
pub const BROKEN_LINKS_REPORT_SHEET: &str = "404s";
pub const QUERIES_REPORT_SHEET: &str = "Queries Last 3 Months";
pub const PAGES_REPORT_SHEET: &str = "Top Pages Last 3 Months";
pub const INDEXED_PAGES_REPORT_SHEET: &str = "Indexed Pages";
pub const TOTAL_CLICKS_REPORT_SHEET: &str = "Total Clicks Last 3 Months";

/// Where a metric's records end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricTarget {
    /// Appended to a per-metric workbook, whose sheet the consolidated report then mirrors.
    Staged {
        workbook: Utf8PathBuf,
        sheet: &'static str,
        report_sheet: &'static str,
    },

    /// Appended straight to a sheet of the consolidated report.
    Direct { report_sheet: &'static str },
}

/// Location and naming of the report's workbooks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSettings {
    /// Directory holding every workbook of the report
    pub directory: Utf8PathBuf,

    /// File name of the consolidated report
    pub consolidated_workbook: String,

    /// File name of the per-metric indexed pages workbook
    pub indexed_pages_workbook: String,

    /// File name of the per-metric total clicks workbook
    pub total_clicks_workbook: String,

    /// `strftime` pattern used to date total clicks snapshots
    pub date_format: String,
}

impl ReportSettings {
    #[must_use]
    pub fn consolidated_path(&self) -> Utf8PathBuf {
        self.directory.join(&self.consolidated_workbook)
    }

    #[must_use]
    pub fn target(&self, kind: MetricKind) -> MetricTarget {
        match kind {
            MetricKind::IndexedPages => MetricTarget::Staged {
                workbook: self.directory.join(&self.indexed_pages_workbook),
                sheet: INDEXED_DATA_SHEET,
                report_sheet: INDEXED_PAGES_REPORT_SHEET,
            },
            MetricKind::TotalClicks => MetricTarget::Staged {
                workbook: self.directory.join(&self.total_clicks_workbook),
                sheet: TOTAL_CLICKS_SHEET,
                report_sheet: TOTAL_CLICKS_REPORT_SHEET,
            },
            MetricKind::BrokenLinks => MetricTarget::Direct {
                report_sheet: BROKEN_LINKS_REPORT_SHEET,
            },
            MetricKind::QueryPerformance => MetricTarget::Direct {
                report_sheet: QUERIES_REPORT_SHEET,
            },
            MetricKind::PagePerformance => MetricTarget::Direct {
                report_sheet: PAGES_REPORT_SHEET,
            },
        }
    }
}

/// How to reach the dashboard pages of the tracked property.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardSettings {
    /// Root of the dashboard, under which every metric page lives
    pub base_url: String,

    /// Identifier of the tracked property, passed as the `resource_id` query parameter
    pub resource_id: String,

    /// Selector of an element that signals a metric page has finished loading
    pub page_ready: String,

    /// Selector of the button that starts an export
    pub export_button: String,

    /// How long to wait for a page element before giving up
    #[serde(with = "humantime_serde")]
    pub page_load_timeout: Duration,
}

impl DashboardSettings {
    /// The dashboard page showing `kind`.
    pub fn page_url(&self, kind: MetricKind) -> Result<Url, url::ParseError> {
        let (path, extra): (&str, &[(&str, &str)]) = match kind {
            MetricKind::IndexedPages => ("index", &[]),
            MetricKind::BrokenLinks => ("index/drilldown", &[("item_key", "CAMYDSAC")]),
            MetricKind::QueryPerformance => ("performance/search-analytics", &[("breakdown", "query")]),
            MetricKind::PagePerformance => ("performance/search-analytics", &[("breakdown", "page")]),
            MetricKind::TotalClicks => ("performance/search-analytics", &[]),
        };

        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }

        let mut url = base.join(path)?;
        {
            let mut query = url.query_pairs_mut();
            let _ = query.append_pair("resource_id", &self.resource_id);
            for (key, value) in extra {
                let _ = query.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// How exports are requested and where their artifacts land.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSettings {
    /// Directory the browser saves downloads to
    pub download_directory: Utf8PathBuf,

    /// Extension of export artifacts, without the leading dot
    pub extension: String,

    /// Total time to wait for an artifact, including the initial delay
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Time between two looks at the download directory
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Time to wait before the first look at the download directory
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Which artifact to take when several match
    #[serde(default)]
    pub selection: ArtifactSelection,

    /// File name prefix of broken link exports
    pub broken_links_prefix: String,

    /// File name prefix of performance exports
    pub performance_prefix: String,
}

impl ExportSettings {
    /// File name prefix of the artifact backing `kind`, or `None` for page-backed metrics.
    #[must_use]
    pub fn prefix_for(&self, kind: MetricKind) -> Option<&str> {
        match kind {
            MetricKind::BrokenLinks => Some(&self.broken_links_prefix),
            MetricKind::QueryPerformance | MetricKind::PagePerformance => Some(&self.performance_prefix),
            MetricKind::IndexedPages | MetricKind::TotalClicks => None,
        }
    }

    #[must_use]
    pub fn job_for(&self, kind: MetricKind) -> Option<ExportJob> {
        self.prefix_for(kind).map(|prefix| ExportJob {
            filename_prefix: prefix.to_string(),
            extension: self.extension.clone(),
            watch_directory: self.download_directory.clone(),
            timeout: self.timeout,
            poll_interval: self.poll_interval,
            initial_delay: self.initial_delay,
        })
    }
}
