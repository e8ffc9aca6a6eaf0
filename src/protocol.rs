//! Wire format for the command stream (stdin) and event stream (stdout).
//!
//! Both directions are newline-delimited JSON. Commands are selected by their
//! `action` field, events by their `type` field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::process::Role;

/// One command record read from the control stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Enumerate the configured process family.
    #[serde(alias = "scan")]
    ScanChrome,
    /// Replace the target set and interval, then enable sampling.
    Start {
        #[serde(default)]
        pids: Vec<u32>,
        /// Seconds; the configured default applies when omitted.
        interval: Option<f64>,
    },
    Stop,
    /// Replace only the fields that are present.
    Update {
        pids: Option<Vec<u32>>,
        interval: Option<f64>,
    },
    /// Report the current sampling configuration.
    Status,
    Exit,
}

/// A single target's reading for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Share of total machine CPU capacity, 0..=100.
    pub cpu: f64,
    /// Private (else resident) memory in MiB.
    pub memory: f64,
}

impl MetricSample {
    pub fn new(cpu_percent: f64, memory_bytes: u64) -> Self {
        Self {
            cpu: round2(cpu_percent),
            memory: round2(memory_bytes as f64 / 1024.0 / 1024.0),
        }
    }
}

/// One entry of a scan result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub proc_type: Role,
    /// Bytes.
    pub memory: u64,
    pub cpu: f64,
}

/// One record written to the event stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Data {
        /// Milliseconds since the Unix epoch.
        timestamp: i64,
        metrics: BTreeMap<u32, Option<MetricSample>>,
    },
    ProcessList {
        data: Vec<ProcessRecord>,
    },
    Status {
        running: bool,
        pids: Vec<u32>,
        /// Seconds.
        interval: f64,
    },
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses one command line. Blank, malformed and unknown records yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Command>(line) {
        Ok(cmd) => Some(cmd),
        Err(e) => {
            tracing::debug!("Discarding unparsable command {:?}: {}", line, e);
            None
        }
    }
}
