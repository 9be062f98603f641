//! Container remuxing with ffmpeg.

use std::path::PathBuf;

use crate::command::ToolCommand;
use crate::workspace::{Artifact, Workspace};

/// Remux the transport stream into the intermediate container, taking
/// chapter markers from the chapter metadata file.
pub fn remux_with_chapters(program: PathBuf, workspace: &Workspace) -> ToolCommand {
    let mut cmd = ToolCommand::new(program);
    cmd.arg("-i")
        .arg(workspace.artifact(Artifact::Stream).to_string_lossy())
        .arg("-i")
        .arg(workspace.artifact(Artifact::Chapters).to_string_lossy())
        .args(["-map_metadata", "1", "-c", "copy"])
        .arg(workspace.artifact(Artifact::Intermediate).to_string_lossy());
    cmd
}

/// Merge the transcoded video with the extracted captions, keeping the
/// metadata of both inputs, and write the result next to the source.
///
/// An existing file at the destination is never overwritten.
pub fn merge_subtitles(program: PathBuf, workspace: &Workspace) -> ToolCommand {
    let mut cmd = ToolCommand::new(program);
    cmd.arg("-n")
        .arg("-i")
        .arg(workspace.artifact(Artifact::Transcoded).to_string_lossy())
        .arg("-i")
        .arg(workspace.artifact(Artifact::Captions).to_string_lossy())
        .args(["-c", "copy", "-map_metadata", "0", "-map_metadata", "1"])
        .arg(workspace.final_output().to_string_lossy());
    cmd
}
