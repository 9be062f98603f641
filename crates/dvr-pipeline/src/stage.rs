//! The [`Stage`] trait defines a single pipeline step.
//!
//! A stage does not run its tool itself. It returns a [`Plan`] describing
//! either a tool invocation or a local step it has already performed, and
//! the [`StageExecutor`](crate::StageExecutor) runs the invocation and
//! applies the stage's [`FailurePolicy`] to the result.

use async_trait::async_trait;
use dvr_av::{BenignExit, ProcessResult, ToolCommand};

use crate::context::JobContext;

/// How a stage's tool failures are treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any nonzero exit or spawn failure aborts the job.
    Fatal,
    /// The listed exits count as success; anything else aborts the job.
    BenignOnCodes(Vec<BenignExit>),
    /// A missing input artifact is not a failure: the stage substitutes a
    /// local step. Failures of the tool itself abort the job.
    FallbackOnMissingPrecondition,
}

impl FailurePolicy {
    /// Exits the process runner should classify as success.
    pub fn benign_exits(&self) -> &[BenignExit] {
        match self {
            FailurePolicy::BenignOnCodes(exits) => exits,
            FailurePolicy::Fatal | FailurePolicy::FallbackOnMissingPrecondition => &[],
        }
    }
}

/// What a stage decided to do.
#[derive(Debug)]
pub enum Plan {
    /// Run this tool invocation.
    Run(ToolCommand),
    /// A local step already ran; carries a summary.
    Completed(String),
    /// The stage's precondition was missing and a local fallback ran.
    Fallback(String),
    /// Nothing to do for this job.
    Skipped(String),
}

/// A single step in the processing pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// A short, human-readable name for this stage (e.g. "Transcode").
    fn name(&self) -> &'static str;

    /// How tool failures in this stage are treated. Defaults to
    /// [`FailurePolicy::Fatal`].
    fn policy(&self) -> FailurePolicy {
        FailurePolicy::Fatal
    }

    /// Decide what to do, performing any local work directly.
    ///
    /// Errors returned here are fatal (e.g. a failed copy).
    async fn plan(&self, ctx: &JobContext) -> dvr_core::Result<Plan>;

    /// Build the error for a tool run that the policy did not accept.
    fn failure(&self, result: ProcessResult) -> dvr_core::Error {
        result.into_error()
    }

    /// Relative weight of this stage for progress reporting. Default is `1.0`.
    fn weight(&self) -> f32 {
        1.0
    }
}
