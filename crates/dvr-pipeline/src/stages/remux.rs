//! First remux: transport stream plus chapters into the intermediate container.

use async_trait::async_trait;
use dvr_av::commands::ffmpeg;
use dvr_av::Tool;

use crate::context::JobContext;
use crate::stage::{Plan, Stage};

#[derive(Debug, Default)]
pub struct RemuxStage;

#[async_trait]
impl Stage for RemuxStage {
    fn name(&self) -> &'static str {
        "Remux to intermediate container"
    }

    async fn plan(&self, ctx: &JobContext) -> dvr_core::Result<Plan> {
        tracing::info!("Remuxing ts file to mp4 and adding chapter markers");
        Ok(Plan::Run(ffmpeg::remux_with_chapters(
            ctx.tools.path(Tool::Ffmpeg),
            &ctx.workspace,
        )))
    }
}
