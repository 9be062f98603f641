//! The process-wide lock file.
//!
//! Existence of the file means a job holds processing rights. A crashed
//! holder is recovered from only by age: a lock older than
//! [`STALE_AFTER_HOURS`] is deleted by the next job that finds it.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;

use super::clock::Clock;
use super::wait::{poll_until, WaitOutcome};

/// Age after which a lock is considered abandoned.
pub const STALE_AFTER_HOURS: i64 = 24;

/// How often a job waiting on a live lock checks whether it is gone.
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// What the gate found at the lock path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Absent,
    Fresh,
    Stale,
}

/// Look at the lock file and classify it by age relative to `now`.
pub fn inspect(path: &Path, now: DateTime<Local>) -> dvr_core::Result<LockState> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LockState::Absent),
        Err(e) => {
            return Err(dvr_core::Error::Lock(format!(
                "cannot inspect {}: {e}",
                path.display()
            )))
        }
    };
    let modified: DateTime<Local> = meta
        .modified()
        .map_err(|e| dvr_core::Error::Lock(format!("cannot read age of {}: {e}", path.display())))?
        .into();

    if now.signed_duration_since(modified) > chrono::Duration::hours(STALE_AFTER_HOURS) {
        Ok(LockState::Stale)
    } else {
        Ok(LockState::Fresh)
    }
}

/// Wait until no live lock stands in the way.
///
/// A stale lock is deleted and the job proceeds. A fresh lock is waited on
/// until it disappears; its age is only judged once, when first seen.
pub async fn wait_for_release(
    path: &Path,
    clock: &dyn Clock,
    interval: Duration,
    cancel: &CancellationToken,
) -> dvr_core::Result<()> {
    match inspect(path, clock.now())? {
        LockState::Absent => Ok(()),
        LockState::Stale => {
            tracing::warn!(
                "Lock file {} is older than {STALE_AFTER_HOURS} hours; removing it",
                path.display()
            );
            remove_if_present(path)
        }
        LockState::Fresh => {
            tracing::info!(
                "Another job holds {}; waiting for it to finish",
                path.display()
            );
            match poll_until(|| !path.exists(), interval, None, cancel).await {
                WaitOutcome::Ready => {
                    tracing::info!("Lock file is gone, moving on");
                    Ok(())
                }
                WaitOutcome::Cancelled => Err(dvr_core::Error::Interrupted),
                WaitOutcome::TimedOut => Err(dvr_core::Error::Internal("lock wait timed out".into())),
            }
        }
    }
}

/// A lock this process created.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    token: String,
}

impl LockFile {
    /// Create the lock file. Fails if any file already exists at `path`,
    /// even one that appeared after the last wait check.
    pub fn acquire(path: &Path, source: &Path) -> dvr_core::Result<Self> {
        let token = uuid::Uuid::new_v4().to_string();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => dvr_core::Error::Lock(format!(
                    "{} was created by another job first",
                    path.display()
                )),
                _ => dvr_core::Error::Lock(format!("cannot create {}: {e}", path.display())),
            })?;

        let lock = Self {
            path: path.to_path_buf(),
            token,
        };
        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        lock.write_body(&mut file, &source_name)?;

        tracing::info!("Created lock file for processing {source_name}");
        Ok(lock)
    }

    /// Write the holder description. On failure the file we just created is
    /// removed again.
    fn write_body(&self, out: &mut impl Write, source_name: &str) -> dvr_core::Result<()> {
        let written = writeln!(out, "Lock file generated by {source_name}\ntoken: {}", self.token)
            .and_then(|()| out.flush());
        if let Err(e) = written {
            if let Err(cleanup) = remove_if_present(&self.path) {
                tracing::warn!("Could not remove half-written lock file: {cleanup}");
            }
            return Err(dvr_core::Error::Lock(format!(
                "cannot write {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the lock if it is still ours. A missing file is fine, and a
    /// lock that now belongs to another job is left alone.
    pub fn release(&self) -> dvr_core::Result<()> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(dvr_core::Error::filesystem("read", &self.path, e)),
        };
        if !contents.contains(&self.token) {
            tracing::warn!(
                "Lock file {} now belongs to another job; leaving it",
                self.path.display()
            );
            return Ok(());
        }
        remove_if_present(&self.path)?;
        tracing::debug!("Released lock file {}", self.path.display());
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> dvr_core::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(dvr_core::Error::filesystem("remove", path, e)),
    }
}
