//! Final remux: transcoded video plus captions, written next to the source.

use async_trait::async_trait;
use dvr_av::commands::ffmpeg;
use dvr_av::Tool;

use crate::context::JobContext;
use crate::stage::{Plan, Stage};

#[derive(Debug, Default)]
pub struct SubtitlesStage;

#[async_trait]
impl Stage for SubtitlesStage {
    fn name(&self) -> &'static str {
        "Re-mux subtitles"
    }

    async fn plan(&self, ctx: &JobContext) -> dvr_core::Result<Plan> {
        let output = ctx.workspace.final_output();
        tracing::info!(
            "Remuxing '{}' with subtitles; outputting back to {}",
            ctx.workspace.name(),
            output.parent().map(|p| p.display().to_string()).unwrap_or_default()
        );
        Ok(Plan::Run(ffmpeg::merge_subtitles(
            ctx.tools.path(Tool::Ffmpeg),
            &ctx.workspace,
        )))
    }
}
