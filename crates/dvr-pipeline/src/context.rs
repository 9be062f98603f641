//! Execution context shared by all stages in one job.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Environment variables removed from every child process. Some ffmpeg
/// builds with hardware acceleration fail to load when the media server's
/// library path leaks into them.
pub const DEFAULT_ENV_REMOVE: &[&str] = &["LD_LIBRARY_PATH"];

/// Context passed to every stage.
#[derive(Debug)]
pub struct JobContext {
    /// Working directory and artifact paths for this job.
    pub workspace: Arc<dvr_av::Workspace>,
    /// Resolved configuration snapshot.
    pub config: Arc<dvr_core::Config>,
    /// Tool locations.
    pub tools: Arc<dvr_av::ToolRegistry>,
    /// Fired on interruption; checked between stages and while tools run.
    pub cancellation: CancellationToken,
    /// Interval for "still running" summaries; `None` disables them.
    pub checkin: Option<Duration>,
    /// Environment variables removed from each child process.
    pub env_remove: Vec<String>,
}

impl JobContext {
    /// Create a new context with the minimum required fields.
    pub fn new(
        workspace: Arc<dvr_av::Workspace>,
        config: Arc<dvr_core::Config>,
        tools: Arc<dvr_av::ToolRegistry>,
    ) -> Self {
        Self {
            workspace,
            config,
            tools,
            cancellation: CancellationToken::new(),
            checkin: None,
            env_remove: DEFAULT_ENV_REMOVE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builder: enable periodic check-ins from running tools.
    pub fn with_checkin(mut self, interval: Option<Duration>) -> Self {
        self.checkin = interval;
        self
    }
}
