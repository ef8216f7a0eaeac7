//! A [`PageSession`] that replays a dashboard session captured on disk.
//!
//! A capture directory holds a `capture.json` file describing, for each metric, which page
//! elements were present, the fields read off the page, and the export artifact the page
//! produced. Export sources are resolved relative to the capture directory.
//!
//! ```json
//! {
//!   "indexed_pages": {
//!     "elements": [".nnLLaf.vtZz6e"],
//!     "fields": { "Indexed Count": "12,345", "Last Updated": "Last updated: 3/4/24" }
//!   },
//!   "broken_links": {
//!     "elements": ["span.izuYW"],
//!     "export": { "source": "coverage.xlsx", "file_name": "example.com-Coverage-Drilldown-2024.xlsx", "delay": "2s" }
//!   }
//! }
//! ```

use super::session::{ElementState, PageExtractor, PageSession};
use super::settings::DashboardSettings;
use crate::Result;
use crate::metrics::{MetricKind, RawRecord};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;
use url::Url;

const LOG_TARGET: &str = "      replay";

/// Name of the file describing a capture, inside the capture directory.
pub const CAPTURE_FILE_NAME: &str = "capture.json";

/// What was observed on one dashboard page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapturedPage {
    /// Selectors of the elements present on the page
    #[serde(default)]
    pub elements: Vec<String>,

    /// Fields read off the page, for page-backed metrics
    #[serde(default)]
    pub fields: Option<RawRecord>,

    /// Artifact the page's export produced, for exported metrics
    #[serde(default)]
    pub export: Option<CapturedExport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapturedExport {
    /// Captured artifact, relative to the capture directory
    pub source: Utf8PathBuf,

    /// Name the artifact is given in the download directory
    pub file_name: String,

    /// Time between triggering the export and the artifact landing
    #[serde(default, with = "humantime_serde")]
    pub delay: Duration,
}

/// Every captured page, keyed by metric.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Capture {
    pages: BTreeMap<MetricKind, CapturedPage>,
}

impl Capture {
    pub fn load(capture_dir: &Utf8Path) -> Result<Self> {
        let path = capture_dir.join(CAPTURE_FILE_NAME);
        let text = fs::read_to_string(&path).into_app_err_with(|| format!("reading capture file '{path}'"))?;
        serde_json::from_str(&text).into_app_err_with(|| format!("parsing capture file '{path}'"))
    }

    #[must_use]
    pub fn page(&self, kind: MetricKind) -> Option<&CapturedPage> {
        self.pages.get(&kind)
    }

    pub fn insert(&mut self, kind: MetricKind, page: CapturedPage) {
        let _ = self.pages.insert(kind, page);
    }
}

/// Replays a [`Capture`] as if it were a live dashboard session.
///
/// Triggered exports are copied into the download directory by a background task after their
/// captured delay, under a temporary name first so a partially copied artifact is never seen.
#[derive(Debug)]
pub struct ReplaySession {
    capture_dir: Utf8PathBuf,
    capture: Capture,
    pages: Vec<(MetricKind, Url)>,
    download_dir: Utf8PathBuf,
    current: Option<(MetricKind, Url)>,
    diagnostics: Vec<String>,
    pending: Vec<JoinHandle<()>>,
}

impl ReplaySession {
    /// Loads the capture in `capture_dir`, mapping each metric to its page on `dashboard`.
    pub fn load(capture_dir: impl Into<Utf8PathBuf>, dashboard: &DashboardSettings, download_dir: impl Into<Utf8PathBuf>) -> Result<Self> {
        let capture_dir = capture_dir.into();
        let capture = Capture::load(&capture_dir)?;
        Self::new(capture_dir, capture, dashboard, download_dir)
    }

    pub fn new(
        capture_dir: impl Into<Utf8PathBuf>,
        capture: Capture,
        dashboard: &DashboardSettings,
        download_dir: impl Into<Utf8PathBuf>,
    ) -> Result<Self> {
        let pages = MetricKind::iter()
            .map(|kind| {
                let url = dashboard
                    .page_url(kind)
                    .into_app_err_with(|| format!("building dashboard URL from '{}'", dashboard.base_url))?;
                Ok((kind, url))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            capture_dir: capture_dir.into(),
            capture,
            pages,
            download_dir: download_dir.into(),
            current: None,
            diagnostics: Vec::new(),
            pending: Vec::new(),
        })
    }

    /// Labels of the diagnostics saved so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    fn current_page(&self) -> Result<(MetricKind, &CapturedPage)> {
        let Some((kind, url)) = &self.current else {
            bail!("no page has been opened");
        };

        match self.capture.page(*kind) {
            Some(page) => Ok((*kind, page)),
            None => bail!("page '{url}' was not captured"),
        }
    }
}

impl PageSession for ReplaySession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        let Some((kind, _)) = self.pages.iter().find(|(_, page)| page == url) else {
            bail!("'{url}' is not a dashboard page");
        };

        if self.capture.page(*kind).is_none() {
            bail!("page '{url}' was not captured");
        }

        log::debug!(target: LOG_TARGET, "Opened '{url}'");
        self.current = Some((*kind, url.clone()));
        Ok(())
    }

    async fn wait_for_element(&mut self, selector: &str, timeout: Duration, state: ElementState) -> Result<()> {
        let (_, page) = self.current_page()?;
        if page.elements.iter().any(|e| e == selector) {
            return Ok(());
        }

        bail!("no element matching '{selector}' became {state} within {timeout:?}");
    }

    async fn trigger_export(&mut self) -> Result<()> {
        let (kind, page) = self.current_page()?;
        let Some(export) = &page.export else {
            bail!("the {kind} page has no captured export");
        };

        let source = self.capture_dir.join(&export.source);
        if !source.exists() {
            bail!("captured export '{source}' does not exist");
        }

        let partial = self.download_dir.join(format!("{}.part", export.file_name));
        let target = self.download_dir.join(&export.file_name);
        let delay = export.delay;

        log::debug!(target: LOG_TARGET, "Export of {kind} will land as '{target}' in {delay:?}");

        self.pending.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let result = match tokio::fs::copy(&source, &partial).await {
                Ok(_) => tokio::fs::rename(&partial, &target).await,
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                log::warn!(target: LOG_TARGET, "Could not deliver export '{target}': {e}");
            }
        }));

        Ok(())
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|(_, url)| url)
    }

    async fn save_diagnostics(&mut self, label: &str) -> Result<()> {
        match self.current_url() {
            Some(url) => log::info!(target: LOG_TARGET, "Diagnostics '{label}' taken on '{url}'"),
            None => log::info!(target: LOG_TARGET, "Diagnostics '{label}' taken before any page was opened"),
        }

        self.diagnostics.push(label.to_string());
        Ok(())
    }

    fn release(&mut self) {
        for task in self.pending.drain(..) {
            task.abort();
        }

        self.current = None;
    }
}

/// Reads the captured fields of the page a [`ReplaySession`] is showing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayExtractor;

impl PageExtractor<ReplaySession> for ReplayExtractor {
    async fn extract(&mut self, session: &mut ReplaySession, kind: MetricKind) -> Result<RawRecord> {
        let (showing, page) = session.current_page()?;
        if showing != kind {
            bail!("session is showing {showing}, not {kind}");
        }

        match &page.fields {
            Some(fields) => Ok(fields.clone()),
            None => bail!("no fields were captured for {kind}"),
        }
    }
}
