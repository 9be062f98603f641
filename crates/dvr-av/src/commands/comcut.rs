//! Commercial removal with comcut.

use std::path::{Path, PathBuf};

use crate::command::ToolCommand;
use crate::workspace::{Artifact, Workspace};

/// Cut the breaks listed in the boundary file out of the workspace stream,
/// keeping the chapter metadata comcut generates at each break.
pub fn cut(program: PathBuf, ini: Option<&Path>, workspace: &Workspace) -> ToolCommand {
    let mut cmd = ToolCommand::new(program);
    cmd.arg("--keep-meta");
    if let Some(ini) = ini {
        cmd.arg(format!("--comskip-ini={}", ini.display()));
    }
    cmd.arg(format!("--work-dir={}", workspace.dir().display()))
        .arg(workspace.artifact(Artifact::Stream).to_string_lossy());
    cmd
}
