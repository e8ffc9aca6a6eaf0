//! Scan command implementation.
//!
//! Prints the same `process_list` event the `scan_chrome` control command emits.

use perfsight_sampler::process::scan_family;
use perfsight_sampler::Event;

use crate::config::Config;

/// Scans the configured process family once and prints the result.
pub fn command_scan(pretty: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let data = scan_family(&config.scan_options());
    let event = Event::ProcessList { data };

    let output = if pretty {
        serde_json::to_string_pretty(&event)?
    } else {
        serde_json::to_string(&event)?
    };
    println!("{}", output);
    Ok(())
}
