//! Test fixtures: a throwaway recording, working directory, and fake tools.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dvr_av::{Tool, ToolRegistry, Workspace};
use dvr_core::Config;
use tempfile::TempDir;

use crate::context::JobContext;

/// Script body for a fake tool that writes its last argument as a file.
pub const WRITES_LAST_ARG: &str =
    "for a; do last=\"$a\"; done\ncase \"$last\" in /*) echo fake > \"$last\" ;; esac\n";

pub struct TestJob {
    root: TempDir,
    config: Config,
    workspace: Arc<Workspace>,
}

impl TestJob {
    pub const SOURCE_BYTES: &'static [u8] = b"\x47fake transport stream";

    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(edit: impl FnOnce(&mut Config)) -> Self {
        let root = tempfile::tempdir().unwrap();
        let recordings = root.path().join("recordings");
        let temp = root.path().join("tmp");
        std::fs::create_dir_all(&recordings).unwrap();
        std::fs::create_dir_all(&temp).unwrap();

        let source = recordings.join("show.ts");
        std::fs::write(&source, Self::SOURCE_BYTES).unwrap();

        let mut config = Config {
            temp_dir: temp.clone(),
            lock_file: temp.join("dvrProcessing.lock"),
            ..Config::default()
        };
        for tool in Tool::ALL {
            *tool_slot(&mut config, tool) = root.path().join("bin").join(tool.name());
        }
        edit(&mut config);

        let workspace = Arc::new(Workspace::create(&source, &temp).unwrap());
        Self {
            root,
            config,
            workspace,
        }
    }

    pub fn source(&self) -> &Path {
        self.workspace.source()
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Install an executable `sh` script standing in for `tool`.
    pub fn install_tool(&mut self, tool: Tool, body: &str) -> PathBuf {
        let bin = self.root.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let path = bin.join(tool.name());
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        *tool_slot(&mut self.config, tool) = path.clone();
        path
    }

    pub fn ctx(&self) -> JobContext {
        let tools = ToolRegistry::discover(&self.config.tools);
        JobContext::new(
            self.workspace.clone(),
            Arc::new(self.config.clone()),
            Arc::new(tools),
        )
    }
}

fn tool_slot(config: &mut Config, tool: Tool) -> &mut PathBuf {
    match tool {
        Tool::Comskip => &mut config.tools.comskip,
        Tool::Comcut => &mut config.tools.comcut,
        Tool::Ccextractor => &mut config.tools.ccextractor,
        Tool::Ffmpeg => &mut config.tools.ffmpeg,
        Tool::Handbrake => &mut config.tools.handbrake,
    }
}
