//! Sample command implementation.
//!
//! Runs the sampler synchronously for a fixed number of ticks and prints one
//! `data` event per tick, without the control protocol.

use std::collections::BTreeSet;
use std::time::Instant;

use perfsight_sampler::process::{logical_core_count, ProcfsProbe};
use perfsight_sampler::sampler::build_event;
use perfsight_sampler::shared::interval_from_secs;
use perfsight_sampler::Sampler;
use tracing::{info, warn};

use crate::config::Config;

/// Samples `pids` `iterations` times, `interval` seconds apart.
pub fn command_sample(
    pids: &[u32],
    iterations: usize,
    interval: f64,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let targets: BTreeSet<u32> = pids.iter().copied().collect();
    let interval = interval_from_secs(interval);
    let mut sampler = Sampler::new(ProcfsProbe::new(config.proc_root()), logical_core_count());

    info!(
        "Sampling {:?} for {} ticks every {:.2}s",
        targets,
        iterations,
        interval.as_secs_f64()
    );

    for tick in 1..=iterations {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let metrics = sampler.tick(&targets, Instant::now());

        match build_event(timestamp_ms, metrics) {
            Some(event) => println!("{}", serde_json::to_string(&event)?),
            None => warn!("Tick {}/{}: no target could be sampled", tick, iterations),
        }

        if tick < iterations {
            std::thread::sleep(interval);
        }
    }

    Ok(())
}
