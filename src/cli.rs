//! CLI arguments and subcommands for perfsight-sampler.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "perfsight-sampler",
    about = "Out-of-process CPU/memory sampler driven by JSON commands on stdin",
    long_about = "Out-of-process CPU/memory sampler driven by JSON commands on stdin.\n\n\
                  Without a subcommand the sampler reads one JSON command per line from stdin \
                  and writes metric and process-list events as JSON lines to stdout. \
                  Diagnostics go to stderr.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (written to stderr, overrides the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// procfs mount point
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Executable names that make up the scanned family (comma-separated)
    #[arg(long)]
    pub family: Option<String>,

    /// Interval in seconds used when `start` omits one
    #[arg(long)]
    pub default_interval: Option<f64>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the process family once and print the process list
    Scan {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Sample the given processes for a fixed number of ticks
    Sample {
        /// Process IDs to sample (repeatable)
        #[arg(short = 'p', long = "pid", required = true)]
        pids: Vec<u32>,

        /// Number of ticks
        #[arg(short = 'n', long, default_value_t = 5)]
        iterations: usize,

        /// Seconds between ticks
        #[arg(short = 'i', long, default_value_t = 1.0)]
        interval: f64,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Validate configuration and system requirements
    Check,
}
