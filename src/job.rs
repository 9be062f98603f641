//! Job coordinator: one invocation from admission to cleanup.
//!
//! [`Job::run`] passes the admission gate, runs the stage pipeline, and then
//! always finalizes: the lock is released, the working directory is removed
//! unless kept, and the source is deleted only after a successful run. Each
//! finalization step runs even if an earlier one failed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dvr_av::{ToolRegistry, Workspace};
use dvr_core::Config;
use dvr_pipeline::{default_stages, JobContext, StageExecutor, TerminalOutcome};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::gate::{AdmissionGate, Clock, LockFile, SystemClock};

/// How one invocation ended.
#[derive(Debug)]
pub struct JobReport {
    /// Process exit status.
    pub exit_code: i32,
    /// The final artifact, when the pipeline succeeded.
    pub output: Option<PathBuf>,
    /// The fatal error, when it did not.
    pub error: Option<dvr_core::Error>,
    /// Finalization steps that failed. These never change the exit status.
    pub cleanup_errors: Vec<dvr_core::Error>,
}

impl JobReport {
    fn failed(error: dvr_core::Error) -> Self {
        Self {
            exit_code: error.exit_code(),
            output: None,
            error: Some(error),
            cleanup_errors: Vec::new(),
        }
    }
}

/// One recording to process.
pub struct Job {
    source: PathBuf,
    config: Arc<Config>,
    tools: Arc<ToolRegistry>,
    clock: Arc<dyn Clock>,
    checkin: Option<Duration>,
    poll_intervals: Option<(Duration, Duration)>,
}

impl Job {
    pub fn new(source: impl Into<PathBuf>, config: Config) -> Self {
        let tools = ToolRegistry::discover(&config.tools);
        Self {
            source: source.into(),
            config: Arc::new(config),
            tools: Arc::new(tools),
            clock: Arc::new(SystemClock),
            checkin: None,
            poll_intervals: None,
        }
    }

    /// Builder: log a summary of running tools' output at this interval.
    pub fn with_checkin(mut self, interval: Option<Duration>) -> Self {
        self.checkin = interval;
        self
    }

    /// Builder: use a different clock for the gate.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: override the gate's quiet-time and lock re-check intervals.
    pub fn with_poll_intervals(mut self, quiet: Duration, lock: Duration) -> Self {
        self.poll_intervals = Some((quiet, lock));
        self
    }

    /// Run the job to completion. Never panics and never skips
    /// finalization once the lock is held.
    pub async fn run(self, cancel: CancellationToken) -> JobReport {
        if !self.source.is_file() {
            let error = dvr_core::Error::filesystem(
                "read",
                &self.source,
                std::io::Error::new(std::io::ErrorKind::NotFound, "source file does not exist"),
            );
            tracing::error!("{error}");
            return JobReport::failed(error);
        }

        let mut gate = AdmissionGate::new(&self.config, self.clock.clone());
        if let Some((quiet, lock)) = self.poll_intervals {
            gate = gate.with_poll_intervals(quiet, lock);
        }
        let lock = match gate.admit(&self.source, &cancel).await {
            Ok(lock) => lock,
            Err(error) => {
                tracing::error!("Not admitted: {error}");
                return JobReport::failed(error);
            }
        };

        let mut finalizer = Finalizer {
            lock: Some(lock),
            workspace: None,
            source: self.source.clone(),
            keep_temp: self.config.keep_temp,
            keep_original: self.config.keep_original,
        };

        let outcome = match Workspace::create(&self.source, &self.config.temp_dir) {
            Ok(workspace) => {
                let workspace = Arc::new(workspace);
                finalizer.workspace = Some(workspace.clone());
                tracing::debug!("Working directory: {}", workspace.dir().display());
                self.execute(workspace, cancel).await
            }
            Err(error) => TerminalOutcome::Failed {
                stage: "setup",
                error,
            },
        };

        let cleanup_errors = finalizer.run(outcome.is_success());
        let exit_code = outcome.exit_code();
        match outcome {
            TerminalOutcome::Completed { output } => {
                tracing::info!("Finished: {}", output.display());
                JobReport {
                    exit_code,
                    output: Some(output),
                    error: None,
                    cleanup_errors,
                }
            }
            TerminalOutcome::Failed { stage, error } => {
                match error.suggestion() {
                    Some(hint) => tracing::error!("{stage} failed: {error} ({hint})"),
                    None => tracing::error!("{stage} failed: {error}"),
                }
                JobReport {
                    exit_code,
                    output: None,
                    error: Some(error),
                    cleanup_errors,
                }
            }
        }
    }

    /// Run the stages on their own task so a panic inside a stage still
    /// comes back here as a fatal outcome.
    async fn execute(&self, workspace: Arc<Workspace>, cancel: CancellationToken) -> TerminalOutcome {
        let ctx = JobContext::new(workspace, self.config.clone(), self.tools.clone())
            .with_cancellation(cancel)
            .with_checkin(self.checkin);
        let executor = StageExecutor::new(default_stages(&self.config));

        let handle = tokio::spawn(async move { executor.run(&ctx).await });
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => TerminalOutcome::Failed {
                stage: "executor",
                error: dvr_core::Error::Internal(format!("pipeline task failed: {e}")),
            },
        }
    }
}

/// The cleanup that follows every admitted job.
///
/// Every step tolerates its target already being gone, so running the
/// finalizer again after a partial cleanup is harmless.
#[derive(Debug)]
pub struct Finalizer {
    pub lock: Option<LockFile>,
    pub workspace: Option<Arc<Workspace>>,
    pub source: PathBuf,
    pub keep_temp: bool,
    pub keep_original: bool,
}

impl Finalizer {
    /// Run every step and return the ones that failed.
    pub fn run(&self, success: bool) -> Vec<dvr_core::Error> {
        let mut errors = Vec::new();

        if let Some(ref lock) = self.lock {
            if let Err(e) = lock.release() {
                errors.push(e);
            }
        }

        if let Some(ref workspace) = self.workspace {
            if self.keep_temp {
                tracing::info!("Keeping working directory {}", workspace.dir().display());
            } else {
                tracing::debug!("Deleting temp directory");
                if let Err(e) = workspace.remove() {
                    errors.push(e);
                }
            }
        }

        if success && !self.keep_original {
            tracing::debug!("Deleting original {}", self.source.display());
            if let Err(e) = remove_source(&self.source) {
                errors.push(e);
            }
        }

        for e in &errors {
            tracing::warn!("Cleanup step failed: {e}");
        }
        errors
    }
}

fn remove_source(path: &Path) -> dvr_core::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(dvr_core::Error::filesystem("remove", path, e)),
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_in(dir: &Path) -> PathBuf {
        let source = dir.join("show.ts");
        std::fs::write(&source, "ts").unwrap();
        source
    }

    #[test]
    fn finalizer_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let lock_path = dir.path().join("dvrProcessing.lock");
        let lock = LockFile::acquire(&lock_path, &source).unwrap();
        let workspace = Arc::new(Workspace::create(&source, dir.path()).unwrap());

        let finalizer = Finalizer {
            lock: Some(lock),
            workspace: Some(workspace.clone()),
            source: source.clone(),
            keep_temp: false,
            keep_original: false,
        };

        assert!(finalizer.run(false).is_empty());
        assert!(!lock_path.exists());
        assert!(!workspace.dir().exists());
        assert!(source.exists(), "source is kept after a failed run");

        assert!(finalizer.run(false).is_empty());
        assert!(finalizer.run(true).is_empty());
        assert!(!source.exists());
        assert!(finalizer.run(true).is_empty());
    }

    #[test]
    fn finalizer_honors_keep_flags() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let workspace = Arc::new(Workspace::create(&source, dir.path()).unwrap());

        let finalizer = Finalizer {
            lock: None,
            workspace: Some(workspace.clone()),
            source: source.clone(),
            keep_temp: true,
            keep_original: true,
        };
        assert!(finalizer.run(true).is_empty());
        assert!(workspace.dir().exists());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn missing_source_fails_before_lock() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            lock_file: dir.path().join("dvrProcessing.lock"),
            temp_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let lock_file = config.lock_file.clone();

        let report = Job::new(dir.path().join("missing.ts"), config)
            .run(CancellationToken::new())
            .await;
        assert_eq!(report.exit_code, 1);
        assert!(report.output.is_none());
        assert!(!lock_file.exists());
    }

    #[tokio::test]
    async fn setup_failure_still_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let config = Config {
            lock_file: dir.path().join("dvrProcessing.lock"),
            temp_dir: dir.path().join("no-such-dir"),
            ignore_quiet_time: true,
            ..Config::default()
        };
        let lock_file = config.lock_file.clone();

        let report = Job::new(&source, config).run(CancellationToken::new()).await;
        assert_eq!(report.exit_code, 1);
        assert!(matches!(report.error, Some(dvr_core::Error::Filesystem { .. })));
        assert!(!lock_file.exists());
        assert!(source.exists());
    }
}
