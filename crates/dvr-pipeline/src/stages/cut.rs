//! Commercial removal, or a blank chapter file when there is nothing to cut.

use async_trait::async_trait;
use dvr_av::commands::comcut;
use dvr_av::{Artifact, Tool};

use crate::context::JobContext;
use crate::stage::{FailurePolicy, Plan, Stage};

/// Contents of an ffmpeg metadata file with no chapters.
pub const EMPTY_FFMETADATA: &str = ";FFMETADATA1";

/// Runs comcut when the scanner wrote a boundary list. Otherwise writes an
/// empty chapter metadata file so the remux stage has its input.
#[derive(Debug, Default)]
pub struct CutStage;

#[async_trait]
impl Stage for CutStage {
    fn name(&self) -> &'static str {
        "Cut commercials"
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::FallbackOnMissingPrecondition
    }

    async fn plan(&self, ctx: &JobContext) -> dvr_core::Result<Plan> {
        let boundaries = ctx.workspace.artifact(Artifact::Boundaries);
        if tokio::fs::try_exists(&boundaries).await.unwrap_or(false) {
            tracing::info!("Commercials detected! Running comcut on '{}'", ctx.workspace.name());
            return Ok(Plan::Run(comcut::cut(
                ctx.tools.path(Tool::Comcut),
                ctx.config.comskip_ini(),
                &ctx.workspace,
            )));
        }

        if !ctx.config.bypass_comskip {
            tracing::info!("No commercials found");
        }

        let chapters = ctx.workspace.artifact(Artifact::Chapters);
        tracing::debug!("Generating blank ffmeta");
        tokio::fs::write(&chapters, EMPTY_FFMETADATA)
            .await
            .map_err(|e| dvr_core::Error::filesystem("write", &chapters, e))?;

        Ok(Plan::Fallback("wrote empty chapter metadata".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestJob;

    #[tokio::test]
    async fn missing_boundaries_writes_placeholder() {
        let job = TestJob::new();
        let ctx = job.ctx();

        let plan = CutStage.plan(&ctx).await.unwrap();
        assert!(matches!(plan, Plan::Fallback(_)));

        let meta = std::fs::read_to_string(ctx.workspace.artifact(Artifact::Chapters)).unwrap();
        assert_eq!(meta, ";FFMETADATA1");
    }

    #[tokio::test]
    async fn boundaries_run_comcut() {
        let job = TestJob::new();
        let ctx = job.ctx();
        std::fs::write(ctx.workspace.artifact(Artifact::Boundaries), "0.00\t30.00\t0\n").unwrap();

        match CutStage.plan(&ctx).await.unwrap() {
            Plan::Run(cmd) => assert_eq!(cmd.program(), ctx.tools.path(Tool::Comcut)),
            other => panic!("expected a tool run, got {other:?}"),
        }
        assert!(!ctx.workspace.artifact(Artifact::Chapters).exists());
    }
}
