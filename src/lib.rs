//! dvrpost: post-processing for DVR recordings.
//!
//! The binary is a thin layer over this library: [`config`] loads the
//! resolved configuration, [`gate`] decides when a job may start, and
//! [`job`] runs one recording through the pipeline and cleans up after it.

pub mod config;
pub mod gate;
pub mod job;
