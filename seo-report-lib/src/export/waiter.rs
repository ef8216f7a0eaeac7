use super::{ArtifactSelection, ExportJob};
use crate::error::ReportError;
use camino::Utf8PathBuf;
use std::fs;
use std::time::SystemTime;
use tokio::time::{Instant, sleep};

const LOG_TARGET: &str = "      export";

/// Polls a directory until an export artifact shows up.
///
/// Waiting only reads the directory listing; the artifact is never moved or deleted here.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportWaiter {
    selection: ArtifactSelection,
}

impl ExportWaiter {
    #[must_use]
    pub const fn new(selection: ArtifactSelection) -> Self {
        Self { selection }
    }

    /// Waits for `job`'s artifact and returns its path.
    ///
    /// The directory is first checked once `job.initial_delay` has passed, then every
    /// `job.poll_interval` until a match is found or `job.timeout` has elapsed since the call.
    pub async fn wait(&self, job: ExportJob) -> Result<Utf8PathBuf, ReportError> {
        let start = Instant::now();

        log::info!(
            target: LOG_TARGET,
            "Waiting up to {:?} for '{}*.{}' in '{}'",
            job.timeout,
            job.filename_prefix,
            job.extension,
            job.watch_directory
        );

        if !job.initial_delay.is_zero() {
            sleep(job.initial_delay.min(job.timeout)).await;
        }

        loop {
            if let Some(path) = self.find_artifact(&job) {
                log::info!(target: LOG_TARGET, "Found export '{path}' after {:?}", start.elapsed());
                return Ok(path);
            }

            let elapsed = start.elapsed();
            if elapsed >= job.timeout {
                log::debug!(target: LOG_TARGET, "Gave up on '{}*.{}' after {elapsed:?}", job.filename_prefix, job.extension);
                return Err(ReportError::ExportTimeout {
                    prefix: job.filename_prefix,
                    extension: job.extension,
                    directory: job.watch_directory,
                    timeout: job.timeout,
                });
            }

            sleep(job.poll_interval.min(job.timeout - elapsed)).await;
        }
    }

    /// Looks for an artifact of `job` in its watch directory right now.
    #[must_use]
    pub fn find_artifact(&self, job: &ExportJob) -> Option<Utf8PathBuf> {
        let entries = match fs::read_dir(&job.watch_directory) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Could not list '{}': {e}", job.watch_directory);
                return None;
            }
        };

        let mut matches = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| !t.is_dir()))
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                job.matches(&name).then(|| {
                    let modified = entry.metadata().and_then(|m| m.modified()).unwrap_or(SystemTime::UNIX_EPOCH);
                    (modified, name)
                })
            });

        let (_, name) = match self.selection {
            ArtifactSelection::FirstListed => matches.next()?,
            ArtifactSelection::Newest => matches.max()?,
        };

        Some(job.watch_directory.join(name))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use core::time::Duration;

    fn job(dir: &tempfile::TempDir) -> ExportJob {
        ExportJob {
            filename_prefix: "example.com-Coverage-Drilldown".into(),
            extension: "xlsx".into(),
            watch_directory: Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap(),
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(1),
            initial_delay: Duration::ZERO,
        }
    }

    fn listing(dir: &tempfile::TempDir) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[tokio::test(start_paused = true)]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_artifact_arriving_after_two_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("example.com-Coverage-Drilldown-2024-03-04.xlsx");

        let writer = tokio::spawn({
            let target = target.clone();
            async move {
                sleep(Duration::from_secs(2)).await;
                fs::write(target, b"xlsx").unwrap();
            }
        });

        let start = Instant::now();
        let found = ExportWaiter::default().wait(job(&dir)).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(found.as_std_path(), target);
        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(elapsed <= Duration::from_secs(3), "{elapsed:?}");
        writer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_timeout_leaves_directory_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("unrelated.xlsx"), b"x").unwrap();
        fs::write(dir.path().join("example.com-Coverage-Drilldown.csv"), b"x").unwrap();
        let before = listing(&dir);

        let start = Instant::now();
        let err = ExportWaiter::default().wait(job(&dir)).await.unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(err.kind(), ErrorKind::ExportTimeout);
        assert!(elapsed >= Duration::from_secs(5), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(6), "{elapsed:?}");
        assert_eq!(listing(&dir), before);
    }

    #[tokio::test(start_paused = true)]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_initial_delay_counts_against_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = job(&dir);
        job.initial_delay = Duration::from_secs(10);

        let start = Instant::now();
        let _ = ExportWaiter::default().wait(job).await.unwrap_err();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(6), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_existing_artifact_found_immediately() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("example.com-Coverage-Drilldown-1.xlsx"), b"x").unwrap();

        let start = Instant::now();
        let found = ExportWaiter::default().wait(job(&dir)).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(found.file_name(), Some("example.com-Coverage-Drilldown-1.xlsx"));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_missing_directory_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = job(&dir);
        job.watch_directory = job.watch_directory.join("not-created");
        job.timeout = Duration::from_millis(20);
        job.poll_interval = Duration::from_millis(5);

        let err = ExportWaiter::default().wait(job).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExportTimeout);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_newest_selection_prefers_latest_modification() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("example.com-Coverage-Drilldown-a.xlsx");
        let new = dir.path().join("example.com-Coverage-Drilldown-b.xlsx");
        fs::write(&new, b"new").unwrap();
        fs::write(&old, b"old").unwrap();

        let old_time = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options().write(true).open(&old).unwrap().set_modified(old_time).unwrap();

        let found = ExportWaiter::new(ArtifactSelection::Newest).find_artifact(&job(&dir)).unwrap();
        assert_eq!(found.as_std_path(), new);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_first_listed_selection_returns_a_match() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("example.com-Coverage-Drilldown-a.xlsx"), b"a").unwrap();
        fs::write(dir.path().join("example.com-Coverage-Drilldown-b.xlsx"), b"b").unwrap();
        fs::write(dir.path().join("other.xlsx"), b"c").unwrap();

        let job = job(&dir);
        let found = ExportWaiter::new(ArtifactSelection::FirstListed).find_artifact(&job).unwrap();
        assert!(job.matches(found.file_name().unwrap()));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_directories_are_not_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("example.com-Coverage-Drilldown.xlsx")).unwrap();
        assert!(ExportWaiter::default().find_artifact(&job(&dir)).is_none());
    }
}
