use crate::Result;
use crate::metrics::MetricKind;
use crate::pipeline::{DashboardSettings, ExportSettings, ReportSettings};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::format::{Item, StrftimeItems};
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use strum::IntoEnumIterator;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Configuration file looked up in the current directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "seo-report.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where the report's workbooks live
    pub report: ReportSettings,

    /// How to reach the dashboard
    pub dashboard: DashboardSettings,

    /// How exports are waited for
    pub exports: ExportSettings,
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails validation
    pub fn load(root: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading seo-report configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = root.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // No config file found, use defaults
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading seo-report configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if durations are inconsistent, names are empty, or the dashboard URL or
    /// date format cannot be used
    fn validate(&self) -> Result<()> {
        let exports = &self.exports;

        if exports.poll_interval.is_zero() {
            return Err(app_err!("exports.poll_interval must be greater than zero"));
        }

        if exports.poll_interval > exports.timeout {
            return Err(app_err!(
                "exports.poll_interval ({:?}) must not exceed exports.timeout ({:?})",
                exports.poll_interval,
                exports.timeout
            ));
        }

        if exports.initial_delay > exports.timeout {
            return Err(app_err!(
                "exports.initial_delay ({:?}) must not exceed exports.timeout ({:?})",
                exports.initial_delay,
                exports.timeout
            ));
        }

        for (name, value) in [
            ("exports.extension", &exports.extension),
            ("exports.broken_links_prefix", &exports.broken_links_prefix),
            ("exports.performance_prefix", &exports.performance_prefix),
            ("report.consolidated_workbook", &self.report.consolidated_workbook),
            ("report.indexed_pages_workbook", &self.report.indexed_pages_workbook),
            ("report.total_clicks_workbook", &self.report.total_clicks_workbook),
        ] {
            if value.trim().is_empty() {
                return Err(app_err!("{name} must not be empty"));
            }
        }

        for kind in MetricKind::iter() {
            let _ = self
                .dashboard
                .page_url(kind)
                .into_app_err_with(|| format!("dashboard.base_url '{}' cannot be used to reach the {kind} page", self.dashboard.base_url))?;
        }

        if StrftimeItems::new(&self.report.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(app_err!("report.date_format '{}' is not a valid strftime pattern", self.report.date_format));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::export::ArtifactSelection;
    use core::time::Duration;

    fn with_exports(f: impl FnOnce(&mut ExportSettings)) -> Config {
        let mut config = Config::default();
        f(&mut config.exports);
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.report.consolidated_workbook, "Monthly_SEO_Metrics.xlsx");
        assert_eq!(config.exports.timeout, Duration::from_secs(25));
        assert_eq!(config.exports.selection, ArtifactSelection::Newest);
        assert_eq!(config.dashboard.page_load_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let config = with_exports(|e| e.poll_interval = Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval"), "{err}");
    }

    #[test]
    fn test_validate_poll_interval_exceeds_timeout() {
        let config = with_exports(|e| e.poll_interval = Duration::from_secs(30));
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_initial_delay_exceeds_timeout() {
        let config = with_exports(|e| e.initial_delay = Duration::from_secs(26));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("initial_delay"), "{err}");
    }

    #[test]
    fn test_validate_initial_delay_equal_to_timeout() {
        let config = with_exports(|e| e.initial_delay = e.timeout);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_empty_prefix() {
        let config = with_exports(|e| e.performance_prefix = "  ".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("performance_prefix"), "{err}");
    }

    #[test]
    fn test_validate_bad_base_url() {
        let mut config = Config::default();
        config.dashboard.base_url = "search console".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"), "{err}");
    }

    #[test]
    fn test_validate_bad_date_format() {
        let mut config = Config::default();
        config.report.date_format = "%m/%d/%Q".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("date_format"), "{err}");
    }

    #[test]
    fn test_load_missing_default_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let config = Config::load(&root, None).unwrap();
        assert_eq!(config.report.directory, "reports");
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let path = root.join("absent.toml");

        let err = Config::load(&root, Some(&path)).unwrap_err();
        assert!(err.to_string().contains("absent.toml"), "{err}");
    }

    #[test]
    fn test_load_default_file_from_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let text = DEFAULT_CONFIG_TOML.replace("directory = \"reports\"", "directory = \"monthly\"");
        fs::write(root.join(DEFAULT_CONFIG_FILE), text).unwrap();

        let config = Config::load(&root, None).unwrap();
        assert_eq!(config.report.directory, "monthly");
    }

    #[test]
    fn test_save_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let path = root.join("out.toml");

        Config::save_default(&path).unwrap();
        let config = Config::load(&root, Some(&path)).unwrap();
        assert_eq!(config.exports.broken_links_prefix, "example.com-Coverage-Drilldown");
    }
}
