//! Closed-caption extraction.

use async_trait::async_trait;
use dvr_av::commands::ccextractor::{self, CcExit};
use dvr_av::{BenignExit, ProcessResult, Tool};

use crate::context::JobContext;
use crate::stage::{FailurePolicy, Plan, Stage};

/// Runs ccextractor to turn the broadcast captions into an SRT file.
///
/// A recording without captions is not a failure. Other nonzero exits are
/// reported with the name ccextractor gives them.
#[derive(Debug, Default)]
pub struct CaptionsStage;

#[async_trait]
impl Stage for CaptionsStage {
    fn name(&self) -> &'static str {
        "Extract captions"
    }

    fn policy(&self) -> FailurePolicy {
        FailurePolicy::BenignOnCodes(vec![BenignExit::code(ccextractor::NO_CAPTIONS_EXIT)])
    }

    async fn plan(&self, ctx: &JobContext) -> dvr_core::Result<Plan> {
        tracing::info!("Extracting subtitles for '{}'", ctx.workspace.name());
        Ok(Plan::Run(ccextractor::extract(
            ctx.tools.path(Tool::Ccextractor),
            &ctx.workspace,
        )))
    }

    fn failure(&self, result: ProcessResult) -> dvr_core::Error {
        let Some(code) = result.code else {
            return result.into_error();
        };
        dvr_core::Error::tool_exit(result.tool, Some(code), CcExit::from_code(code).to_string())
            .with_suggestion(format!(
                "ccextractor exit codes are defined at {}",
                ccextractor::EXIT_CODES_REFERENCE
            ))
    }
}
