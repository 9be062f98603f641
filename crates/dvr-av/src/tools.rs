//! External tool detection and management.
//!
//! The [`ToolRegistry`] resolves the configured locations of the five
//! external tools (comskip, comcut, ccextractor, ffmpeg, HandBrakeCLI) and
//! provides lookup methods for the rest of the workspace.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The external tools the pipeline invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Commercial-boundary scanner.
    Comskip,
    /// Commercial cutter.
    Comcut,
    /// Closed-caption extractor.
    Ccextractor,
    /// Container remuxer.
    Ffmpeg,
    /// Transcoder.
    Handbrake,
}

impl Tool {
    /// Every tool, in pipeline order.
    pub const ALL: [Tool; 5] = [
        Tool::Comskip,
        Tool::Comcut,
        Tool::Ccextractor,
        Tool::Ffmpeg,
        Tool::Handbrake,
    ];

    /// Conventional executable name.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Comskip => "comskip",
            Tool::Comcut => "comcut",
            Tool::Ccextractor => "ccextractor",
            Tool::Ffmpeg => "ffmpeg",
            Tool::Handbrake => "HandBrakeCLI",
        }
    }

    /// Flag that prints the tool's version, if it has one.
    fn version_arg(self) -> Option<&'static str> {
        match self {
            Tool::Ffmpeg => Some("-version"),
            Tool::Handbrake | Tool::Ccextractor => Some("--version"),
            Tool::Comskip | Tool::Comcut => None,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the executable was found.
    pub available: bool,
    /// Version string (first line of the version output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding the location of every tool.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    configured: HashMap<Tool, PathBuf>,
    resolved: HashMap<Tool, PathBuf>,
}

impl ToolRegistry {
    /// Resolve tool locations from configuration.
    ///
    /// A configured path that exists is used directly. Otherwise the
    /// configured value is looked up in `PATH` with [`which::which`]. Tools
    /// that cannot be found keep their configured value, so the failure
    /// surfaces as a spawn failure in the stage that needs the tool.
    pub fn discover(tools_config: &dvr_core::ToolsConfig) -> Self {
        let mut configured = HashMap::new();
        let mut resolved = HashMap::new();

        for tool in Tool::ALL {
            let path = match tool {
                Tool::Comskip => &tools_config.comskip,
                Tool::Comcut => &tools_config.comcut,
                Tool::Ccextractor => &tools_config.ccextractor,
                Tool::Ffmpeg => &tools_config.ffmpeg,
                Tool::Handbrake => &tools_config.handbrake,
            };
            configured.insert(tool, path.clone());

            let found = if path.is_file() {
                Some(path.clone())
            } else {
                which::which(path).ok()
            };
            match found {
                Some(p) => {
                    resolved.insert(tool, p);
                }
                None => tracing::debug!("{tool} not found at {}", path.display()),
            }
        }

        Self {
            configured,
            resolved,
        }
    }

    /// Path to spawn for `tool`: the resolved location when found, the
    /// configured value otherwise.
    pub fn path(&self, tool: Tool) -> PathBuf {
        self.resolved
            .get(&tool)
            .or_else(|| self.configured.get(&tool))
            .cloned()
            .unwrap_or_else(|| PathBuf::from(tool.name()))
    }

    /// Check all tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        Tool::ALL
            .iter()
            .map(|&tool| match self.resolved.get(&tool) {
                Some(path) => ToolInfo {
                    name: tool.name().to_string(),
                    available: true,
                    version: detect_version(tool, path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: tool.name().to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run the tool's version flag and return the first non-empty output line.
fn detect_version(tool: Tool, path: &Path) -> Option<String> {
    let arg = tool.version_arg()?;

    let output = std::process::Command::new(path)
        .arg(arg)
        .env_remove("LD_LIBRARY_PATH")
        .output()
        .ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    stdout
        .lines()
        .chain(stderr.lines())
        .find(|l| !l.trim().is_empty())
        .map(|s| s.trim().to_string())
}
