//! # dvr-av
//!
//! External tool management for the dvrpost pipeline.
//!
//! This crate provides:
//!
//! - **Process runner** ([`ToolCommand`]) -- spawns one tool invocation,
//!   streams its output, and classifies its exit into a [`ProcessResult`].
//! - **Tool discovery** ([`ToolRegistry`]) -- resolves the configured
//!   locations of comskip, comcut, ccextractor, ffmpeg, and HandBrakeCLI.
//! - **Workspace management** ([`Workspace`]) -- the per-job working
//!   directory and its artifact naming scheme.
//! - **Argument builders** ([`commands`]) -- one module per tool.

pub mod command;
pub mod commands;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{BenignExit, ProcessResult, ToolCommand, DEFAULT_CHECKIN_INTERVAL};
pub use tools::{Tool, ToolInfo, ToolRegistry};
pub use workspace::{Artifact, Workspace};
