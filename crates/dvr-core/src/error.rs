//! Unified error type for the dvrpost pipeline.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for the job coordinator to pick a process exit status via
//! [`Error::exit_code`] and print a remediation hint via
//! [`Error::suggestion`].

use std::path::{Path, PathBuf};

/// Exit status used when the pipeline is interrupted by a signal.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit status used for fatal failures that carry no tool exit code.
pub const EXIT_FAILURE: i32 = 1;

/// Unified error type covering every fatal failure mode.
///
/// Benign conditions (quiet-time waits, a busy lock, a stale lock being
/// reclaimed, tool exit codes in a stage's benign set) never become an
/// `Error`; they are absorbed where they occur.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tool binary could not be started at all.
    #[error("Failed to start {tool}: {message}")]
    Spawn {
        /// Name of the tool that failed to start.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A tool exited with a code outside of its benign set.
    #[error("Tool error [{tool}]: {message}")]
    ToolExit {
        /// Name of the tool that failed.
        tool: String,
        /// Raw exit code, if the process exited normally.
        code: Option<i32>,
        /// Human-readable error description.
        message: String,
        /// Optional remediation hint shown after the message.
        suggestion: Option<String>,
    },

    /// A copy, move, or delete on a job artifact failed.
    #[error("Failed to {op} {}: {source}", path.display())]
    Filesystem {
        /// The operation that failed (e.g. "copy", "remove").
        op: &'static str,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O operation failed outside of job artifacts.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The lock file could not be created or inspected.
    #[error("Lock error: {0}")]
    Lock(String),

    /// An interruption signal arrived while the job was running.
    #[error("Interrupted")]
    Interrupted,

    /// The resolved configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to the process exit status the job should end with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolExit {
                code: Some(code), ..
            } if (1..=255).contains(code) => *code,
            Error::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }

    /// Remediation hint for the user, if one is known.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Error::ToolExit { suggestion, .. } => suggestion.as_deref(),
            Error::Spawn { .. } => {
                Some("Check that the tool is installed and that its configured location is correct")
            }
            _ => None,
        }
    }

    /// Convenience constructor for [`Error::Spawn`].
    pub fn spawn(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Spawn {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::ToolExit`] without a hint.
    pub fn tool_exit(tool: impl Into<String>, code: Option<i32>, message: impl Into<String>) -> Self {
        Error::ToolExit {
            tool: tool.into(),
            code,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Convenience constructor for [`Error::Filesystem`].
    pub fn filesystem(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Error::Filesystem {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attach a remediation hint to a [`Error::ToolExit`]. Other variants are
    /// returned unchanged.
    pub fn with_suggestion(self, hint: impl Into<String>) -> Self {
        match self {
            Error::ToolExit {
                tool, code, message, ..
            } => Error::ToolExit {
                tool,
                code,
                message,
                suggestion: Some(hint.into()),
            },
            other => other,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
