//! # dvr-pipeline
//!
//! The ordered processing pipeline for one recording.
//!
//! - [`Stage`] describes one step and its [`FailurePolicy`].
//! - [`StageExecutor`] runs the stages in order and stops at the first
//!   fatal outcome, returning a [`TerminalOutcome`].
//! - [`default_stages`] builds the fixed stage list from configuration.

pub mod context;
pub mod executor;
pub mod factory;
pub mod stage;
pub mod stages;

#[cfg(test)]
mod testing;

pub use context::{JobContext, DEFAULT_ENV_REMOVE};
pub use executor::{StageExecutor, TerminalOutcome};
pub use factory::default_stages;
pub use stage::{FailurePolicy, Plan, Stage};
