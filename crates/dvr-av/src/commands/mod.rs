//! Argument builders for each external tool.
//!
//! Every function returns a fresh [`ToolCommand`](crate::ToolCommand); no
//! argument list is shared or reused between invocations.

pub mod ccextractor;
pub mod comcut;
pub mod comskip;
pub mod ffmpeg;
pub mod handbrake;
