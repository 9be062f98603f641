//! Commercial detection with comskip.

use std::path::{Path, PathBuf};

use crate::command::ToolCommand;
use crate::workspace::{Artifact, Workspace};

/// Exit code comskip uses when it finds no commercials.
pub const NO_COMMERCIALS_EXIT: i32 = 1;

/// Text comskip prints when it finds no commercials.
pub const NO_COMMERCIALS_MARKER: &str = "Commercials were not found";

const BASE_ARGS: &[&str] = &["--pid=0100", "--ts", "--hwassist"];

/// Scan the workspace stream for commercial breaks. When breaks are found
/// comskip writes the boundary list next to the stream.
pub fn scan(program: PathBuf, ini: Option<&Path>, workspace: &Workspace) -> ToolCommand {
    let mut cmd = ToolCommand::new(program);
    cmd.args(BASE_ARGS.iter().copied());
    if let Some(ini) = ini {
        cmd.arg(format!("--ini={}", ini.display()));
    }
    cmd.arg(format!("--output={}", workspace.dir().display()))
        .arg(format!("--output-filename={}", workspace.name()))
        .arg(workspace.artifact(Artifact::Stream).to_string_lossy());
    cmd
}
