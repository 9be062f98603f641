//! Transcoding with HandBrakeCLI.

use std::path::PathBuf;

use crate::command::ToolCommand;
use crate::workspace::{Artifact, Workspace};

/// Encoder and preset selection passed through to HandBrake.
#[derive(Debug, Clone, Default)]
pub struct TranscodeOptions {
    pub presets_import: Option<PathBuf>,
    pub preset_name: Option<String>,
    pub encoder: Option<String>,
    pub encoder_preset: Option<String>,
}

impl From<&dvr_core::Config> for TranscodeOptions {
    fn from(config: &dvr_core::Config) -> Self {
        Self {
            presets_import: config.handbrake_presets_import.clone(),
            preset_name: config.handbrake_preset_name.clone(),
            encoder: config.encoder.clone(),
            encoder_preset: config.encoder_preset.clone(),
        }
    }
}

/// Transcode the intermediate container. Captions are left out here and
/// merged back afterwards, since HandBrake would convert them to SSA.
pub fn transcode(program: PathBuf, options: &TranscodeOptions, workspace: &Workspace) -> ToolCommand {
    let mut cmd = ToolCommand::new(program);

    match options.presets_import {
        Some(ref file) => {
            cmd.arg("--preset-import-file").arg(file.to_string_lossy());
        }
        None => {
            cmd.arg("--preset-import-gui");
        }
    }
    if let Some(ref name) = options.preset_name {
        cmd.arg("--preset").arg(name.as_str());
    }
    if let Some(ref encoder) = options.encoder {
        cmd.arg("--encoder").arg(encoder.as_str());
    }
    if let Some(ref preset) = options.encoder_preset {
        cmd.arg("--encoder-preset").arg(preset.as_str());
    }

    cmd.arg("-i")
        .arg(workspace.artifact(Artifact::Intermediate).to_string_lossy())
        .arg("-o")
        .arg(workspace.artifact(Artifact::Transcoded).to_string_lossy());
    cmd
}
