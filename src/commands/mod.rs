//! CLI command implementations for perfsight-sampler.
//!
//! This module provides implementations for all CLI subcommands:
//! - `scan`: One-shot process family scan
//! - `sample`: Fixed-length sampling run against explicit pids
//! - `config`: Configuration file generation
//! - `check`: System validation

pub mod check;
pub mod config;
pub mod sample;
pub mod scan;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use sample::command_sample;
pub use scan::command_scan;
