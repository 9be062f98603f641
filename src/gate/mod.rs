//! Admission gate: nothing runs during quiet time, and only one job runs
//! at a time.
//!
//! [`AdmissionGate::admit`] waits out the quiet window, then waits for any
//! live lock to go away, then creates the lock. The returned [`LockFile`]
//! must be released at finalization.

pub mod clock;
pub mod lock;
pub mod quiet;
pub mod wait;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub use clock::{Clock, SystemClock};
pub use lock::{LockFile, LOCK_POLL_INTERVAL, STALE_AFTER_HOURS};
pub use quiet::{QuietWindow, QUIET_POLL_INTERVAL};

/// Decides when a job may start.
pub struct AdmissionGate {
    quiet: Option<QuietWindow>,
    lock_path: std::path::PathBuf,
    clock: Arc<dyn Clock>,
    quiet_poll: Duration,
    lock_poll: Duration,
}

impl AdmissionGate {
    pub fn new(config: &dvr_core::Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            quiet: QuietWindow::from_config(config),
            lock_path: config.lock_file.clone(),
            clock,
            quiet_poll: QUIET_POLL_INTERVAL,
            lock_poll: LOCK_POLL_INTERVAL,
        }
    }

    /// Override the re-check intervals.
    pub fn with_poll_intervals(mut self, quiet: Duration, lock: Duration) -> Self {
        self.quiet_poll = quiet;
        self.lock_poll = lock;
        self
    }

    /// Block until the job may start, then take the lock.
    ///
    /// # Errors
    ///
    /// - [`dvr_core::Error::Interrupted`] if `cancel` fires while waiting.
    /// - [`dvr_core::Error::Lock`] if the lock cannot be inspected or
    ///   created.
    pub async fn admit(&self, source: &Path, cancel: &CancellationToken) -> dvr_core::Result<LockFile> {
        if let Some(window) = self.quiet {
            quiet::wait_out(window, self.clock.as_ref(), self.quiet_poll, cancel).await?;
        }
        lock::wait_for_release(&self.lock_path, self.clock.as_ref(), self.lock_poll, cancel).await?;
        LockFile::acquire(&self.lock_path, source)
    }
}
