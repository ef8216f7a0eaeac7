use crate::metrics::{MetricKind, ParseError};
use camino::Utf8PathBuf;
use core::time::Duration;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Boxed underlying cause of a persistence failure.
pub type PersistenceCause = Box<dyn core::error::Error + Send + Sync>;

/// Coarse classification of a [`ReportError`], used for logging and stage summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ErrorKind {
    ExtractionError,
    ExportTimeout,
    ParseError,
    SourceNotFound,
    PersistenceError,
    ArityMismatch,
    HeaderMismatch,
}

/// Errors produced by the extraction, parsing and storage stages of a run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The dashboard session could not produce the expected page content.
    #[error("could not extract {kind} from the dashboard: {reason}")]
    Extraction { kind: MetricKind, reason: String },

    /// No export artifact matching the job appeared within its time budget.
    #[error("no '{prefix}*.{extension}' export appeared in '{directory}' within {timeout:?}")]
    ExportTimeout {
        prefix: String,
        extension: String,
        directory: Utf8PathBuf,
        timeout: Duration,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The workbook or sheet a copy was asked to read from does not exist.
    #[error("{}", source_not_found_message(.path, .sheet.as_deref()))]
    SourceNotFound { path: Utf8PathBuf, sheet: Option<String> },

    /// A workbook could not be opened or saved.
    #[error("could not {action} workbook '{path}': {source}")]
    Persistence {
        action: &'static str,
        path: Utf8PathBuf,
        source: PersistenceCause,
    },

    #[error("row has {actual} cells but sheet '{sheet}' has {expected} columns")]
    ArityMismatch { sheet: String, expected: usize, actual: usize },

    #[error("sheet '{sheet}' in '{path}' has header {existing:?}, cannot merge rows with header {incoming:?}")]
    HeaderMismatch {
        path: Utf8PathBuf,
        sheet: String,
        existing: Vec<String>,
        incoming: Vec<String>,
    },
}

fn source_not_found_message(path: &Utf8PathBuf, sheet: Option<&str>) -> String {
    match sheet {
        Some(sheet) => format!("sheet '{sheet}' not found in source workbook '{path}'"),
        None => format!("source workbook '{path}' not found"),
    }
}

impl ReportError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Extraction { .. } => ErrorKind::ExtractionError,
            Self::ExportTimeout { .. } => ErrorKind::ExportTimeout,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            Self::Persistence { .. } => ErrorKind::PersistenceError,
            Self::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            Self::HeaderMismatch { .. } => ErrorKind::HeaderMismatch,
        }
    }

    pub(crate) fn persistence(action: &'static str, path: impl Into<Utf8PathBuf>, source: impl Into<PersistenceCause>) -> Self {
        Self::Persistence {
            action,
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::metrics::ParseFailure;
    use std::io;

    #[test]
    fn test_kind_matches_variant() {
        let err = ReportError::SourceNotFound {
            path: "a.xlsx".into(),
            sheet: None,
        };
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);

        let err = ReportError::persistence("save", "b.xlsx", io::Error::other("locked"));
        assert_eq!(err.kind(), ErrorKind::PersistenceError);
    }

    #[test]
    fn test_source_not_found_message_mentions_sheet() {
        let err = ReportError::SourceNotFound {
            path: "Indexed_Pages.xlsx".into(),
            sheet: Some("Indexed Data".into()),
        };
        assert_eq!(err.to_string(), "sheet 'Indexed Data' not found in source workbook 'Indexed_Pages.xlsx'");
    }

    #[test]
    fn test_persistence_message_includes_path_and_cause() {
        let err = ReportError::persistence("save", "/tmp/report.xlsx", io::Error::other("file is locked"));
        let msg = err.to_string();
        assert!(msg.contains("/tmp/report.xlsx"));
        assert!(msg.contains("file is locked"));
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err: ReportError = ParseError::new("Clicks", "abc", ParseFailure::NotANumber).into();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.to_string(), "field 'Clicks': 'abc' is not a number");
    }

    #[test]
    fn test_converts_into_app_error() {
        fn stage() -> Result<(), ReportError> {
            Err(ReportError::Extraction {
                kind: MetricKind::TotalClicks,
                reason: "element missing".into(),
            })
        }

        fn fails() -> crate::Result<()> {
            stage()?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert!(format!("{err}").contains("element missing"));
    }
}
