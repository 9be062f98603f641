//! dvr-core: shared error type and resolved configuration.
//!
//! This crate is the foundational dependency for the other dvr-* crates,
//! providing the unified error type with its exit-status mapping and the
//! configuration structure every component reads from.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use config::{Config, ToolsConfig};
pub use error::{Error, Result};
