//! Commercial detection.

use async_trait::async_trait;
use dvr_av::commands::comskip;
use dvr_av::{BenignExit, Tool};

use crate::context::JobContext;
use crate::stage::{FailurePolicy, Plan, Stage};

/// Runs comskip over the working copy.
///
/// comskip exits 1 when it finds no commercials. With
/// `require-scanner-marker` set, that exit only counts as success when the
/// "Commercials were not found" text was printed too, so a crash that
/// happens to exit 1 still aborts the job.
#[derive(Debug)]
pub struct ScanStage {
    require_marker: bool,
}

impl ScanStage {
    pub fn new(require_marker: bool) -> Self {
        Self { require_marker }
    }
}

#[async_trait]
impl Stage for ScanStage {
    fn name(&self) -> &'static str {
        "Scan for commercials"
    }

    fn policy(&self) -> FailurePolicy {
        let exit = if self.require_marker {
            BenignExit::with_marker(comskip::NO_COMMERCIALS_EXIT, comskip::NO_COMMERCIALS_MARKER)
        } else {
            BenignExit::code(comskip::NO_COMMERCIALS_EXIT)
        };
        FailurePolicy::BenignOnCodes(vec![exit])
    }

    async fn plan(&self, ctx: &JobContext) -> dvr_core::Result<Plan> {
        if ctx.config.bypass_comskip {
            return Ok(Plan::Skipped("commercial detection bypassed".into()));
        }

        tracing::info!("Running comskip on '{}'", ctx.workspace.name());
        Ok(Plan::Run(comskip::scan(
            ctx.tools.path(Tool::Comskip),
            ctx.config.comskip_ini(),
            &ctx.workspace,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestJob;

    #[test]
    fn marker_is_required_by_default() {
        let policy = ScanStage::new(true).policy();
        assert_eq!(
            policy.benign_exits(),
            [BenignExit::with_marker(1, "Commercials were not found")]
        );
    }

    #[test]
    fn marker_can_be_relaxed() {
        let policy = ScanStage::new(false).policy();
        assert_eq!(policy.benign_exits(), [BenignExit::code(1)]);
    }

    #[tokio::test]
    async fn bypass_skips_scanner() {
        let job = TestJob::with_config(|c| c.bypass_comskip = true);
        let plan = ScanStage::new(true).plan(&job.ctx()).await.unwrap();
        assert!(matches!(plan, Plan::Skipped(_)));
    }

    #[tokio::test]
    async fn plans_comskip_invocation() {
        let job = TestJob::new();
        let ctx = job.ctx();
        match ScanStage::new(true).plan(&ctx).await.unwrap() {
            Plan::Run(cmd) => {
                assert_eq!(cmd.program(), ctx.tools.path(Tool::Comskip));
                assert!(cmd.arg_list().contains(&"--ts".to_string()));
            }
            other => panic!("expected a tool run, got {other:?}"),
        }
    }
}
