//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from(default_file_name(&format)));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("Configuration written to: {}", output.display());
    }

    Ok(())
}

fn default_file_name(format: &ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "perfsight-sampler.yaml",
        ConfigFormat::Json => "perfsight-sampler.json",
        ConfigFormat::Toml => "perfsight-sampler.toml",
    }
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# PerfSight Sampler Configuration
# ===============================
#
# Process Source
# --------------
# proc_root: "/proc"            # procfs mount point
# family_names:                 # Case-insensitive name substrings matched by scan_chrome
#   - "chrome.exe"
#   - "google chrome"
#   - "chrome"
#
# Sampling
# --------
# default_interval_secs: 1.0    # Interval used when `start` carries none (min 0.5)
# idle_poll_ms: 100             # Poll period while sampling is stopped
#
# Output
# ------
# channel_capacity: 64          # Events buffered ahead of the stdout writer
#
# Logging
# -------
# log_level: "info"             # off, error, warn, info, debug, trace (stderr only)
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_commented_yaml_still_parses() {
        let yaml = render_config(&Config::default(), &ConfigFormat::Yaml).unwrap();
        let commented = add_config_comments(yaml);
        assert!(commented.starts_with("# PerfSight Sampler Configuration"));
        let cfg = parse_config(&commented, Some("yaml")).unwrap();
        assert_eq!(cfg.idle_poll_ms, Some(100));
    }

    #[test]
    fn test_writes_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampler.toml");
        command_config(Some(path.clone()), ConfigFormat::Toml, false).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let cfg = parse_config(&content, Some("toml")).unwrap();
        assert_eq!(cfg.channel_capacity, Some(64));
    }
}
