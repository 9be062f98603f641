//! Transcoding the intermediate container.

use async_trait::async_trait;
use dvr_av::commands::handbrake::{self, TranscodeOptions};
use dvr_av::{ProcessResult, Tool};

use crate::context::JobContext;
use crate::stage::{Plan, Stage};

/// Hint shown when HandBrake fails; builds linked against a system ffmpeg
/// are the usual cause.
pub const INCOMPATIBILITY_HINT: &str =
    "HandBrake does not officially support being built against a system ffmpeg; \
     check the build and the selected encoder";

/// Runs HandBrakeCLI with the configured presets and encoder.
#[derive(Debug)]
pub struct TranscodeStage {
    options: TranscodeOptions,
}

impl TranscodeStage {
    pub fn new(options: TranscodeOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Stage for TranscodeStage {
    fn name(&self) -> &'static str {
        "Transcode"
    }

    async fn plan(&self, ctx: &JobContext) -> dvr_core::Result<Plan> {
        tracing::info!("Transcoding started on '{}'", ctx.workspace.name());
        Ok(Plan::Run(handbrake::transcode(
            ctx.tools.path(Tool::Handbrake),
            &self.options,
            &ctx.workspace,
        )))
    }

    fn failure(&self, result: ProcessResult) -> dvr_core::Error {
        if result.spawn_error.is_some() {
            return result.into_error();
        }
        let mut message = "HandBrakeCLI failed".to_string();
        if let Some(line) = result.last_line() {
            message.push_str(": ");
            message.push_str(line);
        }
        dvr_core::Error::tool_exit(result.tool, result.code, message)
            .with_suggestion(INCOMPATIBILITY_HINT)
    }

    fn weight(&self) -> f32 {
        // Transcoding dominates the runtime of a job.
        20.0
    }
}
