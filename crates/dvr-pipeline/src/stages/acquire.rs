//! Copy the source recording into the working directory.

use async_trait::async_trait;
use dvr_av::Artifact;

use crate::context::JobContext;
use crate::stage::{Plan, Stage};

/// Copies the source file to `<name>.ts` in the working directory. The
/// source itself is never modified.
#[derive(Debug, Default)]
pub struct AcquireStage;

#[async_trait]
impl Stage for AcquireStage {
    fn name(&self) -> &'static str {
        "Acquire original"
    }

    async fn plan(&self, ctx: &JobContext) -> dvr_core::Result<Plan> {
        let source = ctx.workspace.source();
        let dest = ctx.workspace.artifact(Artifact::Stream);

        tracing::debug!("Copying {} to {}", source.display(), ctx.workspace.dir().display());
        let bytes = tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| dvr_core::Error::filesystem("copy", source, e))?;

        Ok(Plan::Completed(format!("copied {bytes} bytes")))
    }
}
