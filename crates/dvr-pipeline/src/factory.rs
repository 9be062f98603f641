//! Stage factory: the fixed stage list for a job.

use dvr_av::commands::handbrake::TranscodeOptions;
use dvr_core::Config;

use crate::stage::Stage;
use crate::stages::{
    AcquireStage, CaptionsStage, CutStage, RemuxStage, ScanStage, SubtitlesStage, TranscodeStage,
};

/// Build the ordered stage list. The order never changes; configuration
/// only fills in parameters.
pub fn default_stages(config: &Config) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(AcquireStage),
        Box::new(ScanStage::new(config.require_scanner_marker)),
        Box::new(CutStage),
        Box::new(CaptionsStage),
        Box::new(RemuxStage),
        Box::new(TranscodeStage::new(TranscodeOptions::from(config))),
        Box::new(SubtitlesStage),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{StageExecutor, TerminalOutcome};
    use crate::testing::{TestJob, WRITES_LAST_ARG};
    use dvr_av::{Artifact, Tool};

    const NO_COMMERCIALS: &str = "echo 'Commercials were not found.'\nexit 1\n";

    fn install_happy_tools(job: &mut TestJob) {
        job.install_tool(Tool::Comskip, NO_COMMERCIALS);
        job.install_tool(Tool::Comcut, "exit 99\n");
        job.install_tool(Tool::Ccextractor, WRITES_LAST_ARG);
        job.install_tool(Tool::Ffmpeg, WRITES_LAST_ARG);
        job.install_tool(Tool::Handbrake, WRITES_LAST_ARG);
    }

    #[test]
    fn stage_order_is_fixed() {
        let executor = StageExecutor::new(default_stages(&Config::default()));
        assert_eq!(
            executor.stage_names(),
            vec![
                "Acquire original",
                "Scan for commercials",
                "Cut commercials",
                "Extract captions",
                "Remux to intermediate container",
                "Transcode",
                "Re-mux subtitles",
            ]
        );
    }

    #[tokio::test]
    async fn full_pipeline_without_commercials() {
        let mut job = TestJob::new();
        install_happy_tools(&mut job);
        let ctx = job.ctx();

        let outcome = StageExecutor::new(default_stages(&ctx.config)).run(&ctx).await;
        match outcome {
            TerminalOutcome::Completed { output } => {
                assert_eq!(output, job.root().join("recordings/show.mkv"));
                assert!(output.exists());
            }
            other => panic!("expected success, got {other:?}"),
        }

        let meta = std::fs::read_to_string(ctx.workspace.artifact(Artifact::Chapters)).unwrap();
        assert_eq!(meta, ";FFMETADATA1");
        assert!(ctx.workspace.artifact(Artifact::Transcoded).exists());
    }

    #[tokio::test]
    async fn scanner_crash_without_marker_is_fatal() {
        let mut job = TestJob::new();
        install_happy_tools(&mut job);
        job.install_tool(Tool::Comskip, "echo 'segmentation fault' >&2\nexit 1\n");
        let ctx = job.ctx();

        match StageExecutor::new(default_stages(&ctx.config)).run(&ctx).await {
            TerminalOutcome::Failed { stage, error } => {
                assert_eq!(stage, "Scan for commercials");
                assert_eq!(error.exit_code(), 1);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn captions_failure_stops_before_remux() {
        let mut job = TestJob::new();
        install_happy_tools(&mut job);
        job.install_tool(Tool::Ccextractor, "exit 3\n");
        let ctx = job.ctx();

        match StageExecutor::new(default_stages(&ctx.config)).run(&ctx).await {
            TerminalOutcome::Failed { stage, error } => {
                assert_eq!(stage, "Extract captions");
                assert!(error.to_string().contains("too many input files"));
                assert_eq!(error.exit_code(), 3);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!ctx.workspace.artifact(Artifact::Intermediate).exists());
    }

    #[tokio::test]
    async fn no_captions_continues() {
        let mut job = TestJob::new();
        install_happy_tools(&mut job);
        job.install_tool(Tool::Ccextractor, "exit 10\n");
        let ctx = job.ctx();

        let outcome = StageExecutor::new(default_stages(&ctx.config)).run(&ctx).await;
        assert!(outcome.is_success(), "got {outcome:?}");
    }

    #[tokio::test]
    async fn commercials_found_runs_cutter() {
        let mut job = TestJob::new();
        install_happy_tools(&mut job);
        let paths_ctx = job.ctx();
        let edl = paths_ctx.workspace.artifact(Artifact::Boundaries);
        let chapters = paths_ctx.workspace.artifact(Artifact::Chapters);
        job.install_tool(
            Tool::Comskip,
            &format!("printf '0.00\\t30.00\\t0\\n' > '{}'\n", edl.display()),
        );
        job.install_tool(
            Tool::Comcut,
            &format!("echo ';FFMETADATA1\\n[CHAPTER]' > '{}'\n", chapters.display()),
        );
        let ctx = job.ctx();

        let outcome = StageExecutor::new(default_stages(&ctx.config)).run(&ctx).await;
        assert!(outcome.is_success(), "got {outcome:?}");
        let meta = std::fs::read_to_string(&chapters).unwrap();
        assert!(meta.contains("[CHAPTER]"));
    }

    #[tokio::test]
    async fn transcode_failure_carries_code_and_hint() {
        let mut job = TestJob::new();
        install_happy_tools(&mut job);
        job.install_tool(Tool::Handbrake, "echo 'libhb: encoder failed' >&2\nexit 2\n");
        let ctx = job.ctx();

        match StageExecutor::new(default_stages(&ctx.config)).run(&ctx).await {
            TerminalOutcome::Failed { stage, error } => {
                assert_eq!(stage, "Transcode");
                assert_eq!(error.exit_code(), 2);
                assert!(error.suggestion().is_some());
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!job.root().join("recordings/show.mkv").exists());
    }

    #[tokio::test]
    async fn final_output_is_never_overwritten() {
        let mut job = TestJob::new();
        install_happy_tools(&mut job);
        job.install_tool(
            Tool::Ffmpeg,
            "for a; do last=\"$a\"; done\n\
             if [ \"$1\" = \"-n\" ] && [ -e \"$last\" ]; then exit 1; fi\n\
             echo fake > \"$last\"\n",
        );
        let existing = job.root().join("recordings/show.mkv");
        std::fs::write(&existing, "keep me").unwrap();
        let ctx = job.ctx();

        let outcome = StageExecutor::new(default_stages(&ctx.config)).run(&ctx).await;
        assert!(!outcome.is_success());
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "keep me");
    }
}
