use camino::Utf8PathBuf;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// How to pick an artifact when more than one file matches an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSelection {
    /// The most recently modified match, ties broken by file name.
    #[default]
    Newest,

    /// Whichever match the directory listing yields first.
    FirstListed,
}

/// A pending export, waited on exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    /// Leading part of the artifact's file name.
    pub filename_prefix: String,

    /// Artifact file extension, without the leading dot.
    pub extension: String,

    /// Directory the artifact is expected to appear in.
    pub watch_directory: Utf8PathBuf,

    /// Total time budget, counted from the start of the wait and including `initial_delay`.
    pub timeout: Duration,
    pub poll_interval: Duration,

    /// Time to wait before the first look at the directory.
    pub initial_delay: Duration,
}

impl ExportJob {
    /// Whether `file_name` is an artifact of this job.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        let extension = self.extension.trim_start_matches('.');
        file_name.starts_with(&self.filename_prefix)
            && file_name
                .strip_suffix(extension)
                .is_some_and(|stem| stem.len() >= self.filename_prefix.len() && stem.ends_with('.'))
    }
}
