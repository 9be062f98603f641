//! Shared fixtures for integration tests.
//!
//! [`Sandbox`] lays out a recordings directory with `show.ts`, a temp
//! directory for working directories and the lock, and a `bin/` directory of
//! shell scripts standing in for the external tools.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use dvr_core::Config;
use tempfile::TempDir;

/// Writes its last argument as a file, like a tool producing its output.
/// Relative arguments such as `--version` are left alone.
pub const WRITES_LAST_ARG: &str =
    "for a; do last=\"$a\"; done\ncase \"$last\" in /*) echo fake > \"$last\" ;; esac\n";

/// comskip's output when a recording has no commercials.
pub const NO_COMMERCIALS: &str = "echo 'Commercials were not found.'\nexit 1\n";

/// Fails unless the media server's library path was removed.
pub const SCRUBBED_WRITES_LAST_ARG: &str =
    "[ -z \"$LD_LIBRARY_PATH\" ] || exit 42\nfor a; do last=\"$a\"; done\ncase \"$last\" in /*) echo fake > \"$last\" ;; esac\n";

pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    /// A sandbox whose tools all succeed and find no commercials.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("recordings")).unwrap();
        std::fs::create_dir_all(dir.path().join("tmp")).unwrap();
        std::fs::write(dir.path().join("recordings/show.ts"), b"\x47 transport stream").unwrap();

        let sandbox = Self { dir };
        sandbox.tool("comskip", NO_COMMERCIALS);
        sandbox.tool("comcut", "exit 99\n");
        sandbox.tool("ccextractor", WRITES_LAST_ARG);
        sandbox.tool("ffmpeg", SCRUBBED_WRITES_LAST_ARG);
        sandbox.tool("HandBrakeCLI", WRITES_LAST_ARG);
        sandbox
    }

    /// Replace the script for one tool.
    pub fn tool(&self, name: &str, body: &str) -> PathBuf {
        let bin = self.dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let path = bin.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.root().join("recordings/show.ts")
    }

    pub fn output(&self) -> PathBuf {
        self.root().join("recordings/show.mkv")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root().join("tmp")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.temp_dir().join("dvrProcessing.lock")
    }

    /// Working directories currently present in the temp dir.
    pub fn working_dirs(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with("plex-"))
            })
            .collect()
    }

    pub fn config(&self) -> Config {
        let bin = self.root().join("bin");
        let mut config = Config {
            ignore_quiet_time: true,
            lock_file: self.lock_file(),
            temp_dir: self.temp_dir(),
            ..Config::default()
        };
        config.tools.comskip = bin.join("comskip");
        config.tools.comcut = bin.join("comcut");
        config.tools.ccextractor = bin.join("ccextractor");
        config.tools.ffmpeg = bin.join("ffmpeg");
        config.tools.handbrake = bin.join("HandBrakeCLI");
        config
    }

    /// Write [`Sandbox::config`] as a JSON file for the CLI.
    pub fn write_config(&self) -> PathBuf {
        let path = self.root().join("config.json");
        std::fs::write(&path, self.config().to_json_pretty().unwrap()).unwrap();
        path
    }
}
