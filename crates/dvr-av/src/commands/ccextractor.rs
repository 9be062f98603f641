//! Caption extraction with ccextractor, and its exit-code catalog.

use std::fmt;
use std::path::PathBuf;

use crate::command::ToolCommand;
use crate::workspace::{Artifact, Workspace};

/// Where the exit codes below are defined.
pub const EXIT_CODES_REFERENCE: &str =
    "https://github.com/CCExtractor/ccextractor/blob/v0.88/src/lib_ccx/ccx_common_common.h";

/// Exit code for a recording that carries no captions.
pub const NO_CAPTIONS_EXIT: i32 = 10;

const BASE_ARGS: &[&str] = &[
    "-in=ts",
    "-out=srt",
    "--nofontcolor",
    "--notypesetting",
    "-noru",
    "--splitbysentence",
];

/// Extract closed captions from the workspace stream into an SRT file.
pub fn extract(program: PathBuf, workspace: &Workspace) -> ToolCommand {
    let mut cmd = ToolCommand::new(program);
    cmd.args(BASE_ARGS.iter().copied())
        .arg(workspace.artifact(Artifact::Stream).to_string_lossy())
        .arg("-o")
        .arg(workspace.artifact(Artifact::Captions).to_string_lossy());
    cmd
}

/// A failed ccextractor run, named by its exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcExit {
    NoInputFiles,
    TooManyInputFiles,
    BadParameters,
    HelpShown,
    Other(i32),
}

impl CcExit {
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => CcExit::NoInputFiles,
            3 => CcExit::TooManyInputFiles,
            4 | 7 => CcExit::BadParameters,
            9 => CcExit::HelpShown,
            other => CcExit::Other(other),
        }
    }
}

impl fmt::Display for CcExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CcExit::NoInputFiles => f.write_str("CCEXTRACTOR exited with no input files"),
            CcExit::TooManyInputFiles => {
                f.write_str("CCEXTRACTOR exited with too many input files")
            }
            CcExit::BadParameters => f.write_str("CCEXTRACTOR exited due to bad parameters"),
            CcExit::HelpShown => f.write_str("CCEXTRACTOR exited with help text"),
            CcExit::Other(code) => write!(f, "CCEXTRACTOR exited with code {code}"),
        }
    }
}
