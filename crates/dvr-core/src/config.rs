//! Resolved job configuration.
//!
//! The top-level [`Config`] is the single structure handed to the gate, the
//! stage executor, and the job coordinator. It is deserialized from JSON with
//! kebab-case keys (the same keys the command line uses) and every field
//! defaults sensibly, so an empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Lock file name inside the system temp directory.
pub const LOCK_FILE_NAME: &str = "dvrProcessing.lock";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Quiet window in `HH-HH` form. Unset or unparseable means no quiet time.
    pub quiet_time: Option<String>,
    /// Skip the quiet-time check entirely.
    pub ignore_quiet_time: bool,
    /// Keep the source recording after a successful run.
    pub keep_original: bool,
    /// Keep the working directory after the run.
    pub keep_temp: bool,
    /// Encoder name passed opaquely to the transcoder.
    pub encoder: Option<String>,
    /// Encoder preset passed opaquely to the transcoder.
    pub encoder_preset: Option<String>,
    /// HandBrake presets file to import instead of the GUI presets.
    pub handbrake_presets_import: Option<PathBuf>,
    /// HandBrake preset to select.
    pub handbrake_preset_name: Option<String>,
    /// Skip commercial detection and go straight to the placeholder metadata.
    pub bypass_comskip: bool,
    /// Treat a scanner "no commercials" exit as benign only when its output
    /// also carries the marker text.
    pub require_scanner_marker: bool,
    /// Location of the process-wide lock file.
    pub lock_file: PathBuf,
    /// Parent directory for per-job working directories.
    pub temp_dir: PathBuf,
    /// Scanner configuration file (`comskip.ini`).
    pub comskip_ini: Option<PathBuf>,
    /// Locations of the external tools.
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        let temp_dir = std::env::temp_dir();
        Self {
            quiet_time: None,
            ignore_quiet_time: false,
            keep_original: false,
            keep_temp: false,
            encoder: None,
            encoder_preset: None,
            handbrake_presets_import: None,
            handbrake_preset_name: None,
            bypass_comskip: false,
            require_scanner_marker: true,
            lock_file: temp_dir.join(LOCK_FILE_NAME),
            temp_dir,
            comskip_ini: None,
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Serialize to pretty JSON, the format printed by `--sample-config`.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("config serialize error: {e}")))
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(ref quiet) = self.quiet_time {
            if self.ignore_quiet_time {
                warnings.push(format!(
                    "quiet-time '{quiet}' is set but ignore-quiet-time overrides it"
                ));
            } else if !is_hour_range(quiet) {
                warnings.push(format!(
                    "quiet-time '{quiet}' is not in HH-HH form; no quiet time will be applied"
                ));
            }
        }

        if let Some(ref ini) = self.comskip_ini {
            if !ini.exists() && !self.bypass_comskip {
                warnings.push(format!("comskip-ini {} does not exist", ini.display()));
            }
        }

        if let Some(ref presets) = self.handbrake_presets_import {
            if !presets.exists() {
                warnings.push(format!(
                    "handbrake-presets-import {} does not exist",
                    presets.display()
                ));
            }
        }

        if !self.temp_dir.is_dir() {
            warnings.push(format!("temp-dir {} is not a directory", self.temp_dir.display()));
        }

        warnings
    }

    /// The scanner configuration file, if one is configured and present.
    /// A configured file that is missing is reported by [`Config::validate`]
    /// and the scanner falls back to its built-in settings.
    pub fn comskip_ini(&self) -> Option<&Path> {
        self.comskip_ini.as_deref().filter(|p| p.is_file())
    }
}

/// `true` when the string contains two two-digit numbers around a dash.
fn is_hour_range(s: &str) -> bool {
    let Some((start, end)) = s.split_once('-') else {
        return false;
    };
    let two_digits = |p: &str| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit());
    two_digits(start) && two_digits(end)
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Locations of the external tools. Bare names are resolved through `PATH`
/// when the tool is spawned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolsConfig {
    pub comskip: PathBuf,
    pub comcut: PathBuf,
    pub ccextractor: PathBuf,
    pub ffmpeg: PathBuf,
    pub handbrake: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            comskip: PathBuf::from("comskip"),
            comcut: PathBuf::from("comcut"),
            ccextractor: PathBuf::from("ccextractor"),
            ffmpeg: PathBuf::from("ffmpeg"),
            handbrake: PathBuf::from("HandBrakeCLI"),
        }
    }
}
