use crate::Result;
use camino::Utf8Path;
use fs4::fs_std::FileExt;
use ohno::IntoAppError;
use std::fs::{File, OpenOptions};

const LOG_TARGET: &str = "        lock";

/// Name of the lock file created in the report directory.
pub const LOCK_FILE_NAME: &str = "seo-report.lock";

/// Guard that releases the run lock when dropped
#[derive(Debug)]
pub struct RunLockGuard(File);

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.unlock() {
            log::warn!(target: LOG_TARGET, "Could not release run lock: {e:#}");
        }
    }
}

/// Takes the advisory lock that keeps two runs from touching the same report at once.
///
/// Blocks until any other holder of the lock on `report_dir` has released it.
pub async fn acquire_run_lock(report_dir: &Utf8Path) -> Result<RunLockGuard> {
    let lock_path = report_dir.join(LOCK_FILE_NAME);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .into_app_err_with(|| format!("opening run lock file '{lock_path}'"))?;

    let file = tokio::task::spawn_blocking(move || {
        file.lock_exclusive()
            .into_app_err_with(|| format!("acquiring exclusive run lock '{lock_path}'"))?;
        log::debug!(target: LOG_TARGET, "Acquired run lock '{lock_path}'");
        Ok::<_, ohno::AppError>(file)
    })
    .await
    .into_app_err("run lock task panicked")??;

    Ok(RunLockGuard(file))
}
