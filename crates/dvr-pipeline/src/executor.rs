//! Stage executor: runs the ordered stage list against one job, applying
//! each stage's failure policy and stopping at the first fatal outcome.
//!
//! Stages run strictly one after another. Nothing is rolled back on
//! failure; earlier artifacts stay in the working directory until the job
//! coordinator decides whether to remove it.

use std::path::PathBuf;

use crate::context::JobContext;
use crate::stage::{Plan, Stage};

/// How a pipeline run ended.
#[derive(Debug)]
pub enum TerminalOutcome {
    /// Every stage finished; `output` is the final artifact.
    Completed { output: PathBuf },
    /// A stage failed fatally, or the job was interrupted before or during it.
    Failed {
        stage: &'static str,
        error: dvr_core::Error,
    },
}

impl TerminalOutcome {
    /// `true` when the pipeline reached its terminal success stage.
    pub fn is_success(&self) -> bool {
        matches!(self, TerminalOutcome::Completed { .. })
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            TerminalOutcome::Completed { .. } => 0,
            TerminalOutcome::Failed { error, .. } => error.exit_code(),
        }
    }
}

/// Runs a fixed list of stages in order.
pub struct StageExecutor {
    stages: Vec<Box<dyn Stage>>,
}

impl StageExecutor {
    /// Create a new executor from a list of stages.
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Names of the stages, in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Compute the total weight of all stages.
    fn total_weight(&self) -> f32 {
        self.stages.iter().map(|s| s.weight()).sum()
    }

    /// Run every stage in order and return how the pipeline ended.
    pub async fn run(&self, ctx: &JobContext) -> TerminalOutcome {
        if self.stages.is_empty() {
            return TerminalOutcome::Failed {
                stage: "executor",
                error: dvr_core::Error::Internal("no stages to execute".into()),
            };
        }

        let total_weight = self.total_weight();
        let mut completed_weight: f32 = 0.0;

        for stage in &self.stages {
            if ctx.cancellation.is_cancelled() {
                tracing::info!("Pipeline cancelled before {}", stage.name());
                return TerminalOutcome::Failed {
                    stage: stage.name(),
                    error: dvr_core::Error::Interrupted,
                };
            }

            tracing::info!("Starting: {}", stage.name());
            if let Err(error) = self.run_stage(stage.as_ref(), ctx).await {
                tracing::error!("Stage {} failed: {error}", stage.name());
                return TerminalOutcome::Failed {
                    stage: stage.name(),
                    error,
                };
            }

            completed_weight += stage.weight();
            let pct = percent_done(completed_weight, total_weight);
            tracing::info!("[{:.0}%] Completed: {}", pct, stage.name());
        }

        TerminalOutcome::Completed {
            output: ctx.workspace.final_output(),
        }
    }

    /// Plan one stage, run its tool if it has one, and apply its policy.
    async fn run_stage(&self, stage: &dyn Stage, ctx: &JobContext) -> dvr_core::Result<()> {
        let policy = stage.policy();

        match stage.plan(ctx).await? {
            Plan::Run(mut cmd) => {
                for exit in policy.benign_exits() {
                    cmd.benign(exit.clone());
                }
                for key in &ctx.env_remove {
                    cmd.env_remove(key.as_str());
                }
                cmd.checkin(ctx.checkin);

                let result = cmd.run(&ctx.cancellation).await?;
                if !result.success {
                    return Err(stage.failure(result));
                }
                if result.is_benign() {
                    tracing::info!(
                        "{}: {} exited with code {} which is not an error here",
                        stage.name(),
                        result.tool,
                        result.code.unwrap_or_default()
                    );
                }
            }
            Plan::Completed(summary) => tracing::debug!("{}: {summary}", stage.name()),
            Plan::Fallback(summary) => tracing::info!("{}: {summary}", stage.name()),
            Plan::Skipped(reason) => tracing::info!("{}: skipped ({reason})", stage.name()),
        }

        Ok(())
    }
}

/// Share of the pipeline's weight that is done, as a percentage.
fn percent_done(completed: f32, total: f32) -> f32 {
    if total > 0.0 {
        (completed / total) * 100.0
    } else {
        100.0
    }
}
