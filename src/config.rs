//! Configuration management for perfsight-sampler.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use perfsight_sampler::output::DEFAULT_CHANNEL_CAPACITY;
use perfsight_sampler::process::{ScanOptions, DEFAULT_FAMILY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_INTERVAL_SECS: f64 = 1.0;
pub const DEFAULT_IDLE_POLL_MS: u64 = 100;

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Process source
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    /// Case-insensitive executable name substrings for `scan_chrome`
    #[serde(alias = "family-names")]
    pub family_names: Option<Vec<String>>,

    // Sampling
    /// Interval applied when `start` carries none (seconds)
    #[serde(alias = "default-interval-secs")]
    pub default_interval_secs: Option<f64>,
    /// Snapshot poll period while sampling is stopped (milliseconds)
    #[serde(alias = "idle-poll-ms")]
    pub idle_poll_ms: Option<u64>,

    // Output
    /// Events buffered between producers and the stdout writer
    #[serde(alias = "channel-capacity")]
    pub channel_capacity: Option<usize>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            family_names: Some(DEFAULT_FAMILY.iter().map(|s| s.to_string()).collect()),
            default_interval_secs: Some(DEFAULT_INTERVAL_SECS),
            idle_poll_ms: Some(DEFAULT_IDLE_POLL_MS),
            channel_capacity: Some(DEFAULT_CHANNEL_CAPACITY),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            proc_root: self.proc_root(),
            family_names: self
                .family_names
                .clone()
                .unwrap_or_else(|| DEFAULT_FAMILY.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn default_interval(&self) -> Duration {
        perfsight_sampler::shared::interval_from_secs(
            self.default_interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS),
        )
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms.unwrap_or(DEFAULT_IDLE_POLL_MS))
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(family) = &cfg.family_names {
        if family.iter().all(|f| f.trim().is_empty()) {
            return Err("family_names must contain at least one non-empty name".into());
        }
    }

    if let Some(secs) = cfg.default_interval_secs {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(format!(
                "default_interval_secs must be a positive number, got {}",
                secs
            )
            .into());
        }
    }

    if cfg.idle_poll_ms == Some(0) {
        return Err("idle_poll_ms must be greater than 0".into());
    }

    if cfg.channel_capacity == Some(0) {
        return Err("channel_capacity must be greater than 0".into());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        match level {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(format!(
                    "Invalid log_level '{}', expected off/error/warn/info/debug/trace",
                    other
                )
                .into());
            }
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }

    // Parse comma-separated family names
    if let Some(family_str) = &args.family {
        config.family_names = Some(
            family_str
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        );
    }

    if let Some(secs) = args.default_interval {
        config.default_interval_secs = Some(secs);
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/perfsight/sampler.yaml",
            "/etc/perfsight/sampler.yml",
            "/etc/perfsight/sampler.json",
            "./perfsight-sampler.yaml",
            "./perfsight-sampler.yml",
            "./perfsight-sampler.json",
        ];

        match defaults.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        }
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config text by file extension; anything unknown is treated as YAML.
pub fn parse_config(
    content: &str,
    extension: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
