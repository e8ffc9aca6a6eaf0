//! PerfSight resource sampler library
//!
//! A long-lived sampler that measures CPU and memory of a changing set of
//! processes and streams the results as newline-delimited JSON, while a
//! control stream changes what is sampled and how often.
//!
//! # Components
//!
//! - **Shared configuration** ([`shared::SharedConfig`]): enabled flag, target
//!   set and interval behind a single lock
//! - **Sampler** ([`sampler::Sampler`], [`sampler::run_sampler`]): per-target
//!   baselines and the perpetual sampling loop
//! - **Control loop** ([`control::ControlLoop`]): applies one command per line
//! - **Output** ([`output`]): the serialized event stream
//! - **Process layer** ([`process`]): procfs probe, scanner and role classifier
//!
//! # Usage
//!
//! ```no_run
//! use perfsight_sampler::{
//!     control::ControlLoop, output, process::{logical_core_count, ProcfsProbe, ScanOptions},
//!     sampler::{run_sampler, Sampler, DEFAULT_IDLE_POLL}, shared::{SharedConfig, DEFAULT_INTERVAL},
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() -> std::io::Result<()> {
//! let shared = Arc::new(SharedConfig::default());
//! let (sink, stream) = output::channel(output::DEFAULT_CHANNEL_CAPACITY);
//!
//! tokio::spawn(output::run_writer(stream, tokio::io::stdout()));
//! let sampler = Sampler::new(ProcfsProbe::default(), logical_core_count());
//! tokio::spawn(run_sampler(sampler, shared.clone(), sink.clone(), DEFAULT_IDLE_POLL));
//!
//! let control = ControlLoop::new(shared, sink, ScanOptions::default(), DEFAULT_INTERVAL);
//! control.run(tokio::io::BufReader::new(tokio::io::stdin())).await?;
//! # Ok(())
//! # }
//! ```

pub mod control;
pub mod error;
pub mod output;
pub mod process;
pub mod protocol;
pub mod sampler;
pub mod shared;

// Re-export main types for convenience
pub use control::{ControlLoop, Flow, Shutdown};
pub use error::{ControlError, OutputError, ProbeError};
pub use output::{EventSink, EventStream};
pub use protocol::{Command, Event, MetricSample, ProcessRecord};
pub use sampler::{run_sampler, Sampler, SamplingStore};
pub use shared::{SharedConfig, Snapshot, MIN_INTERVAL};
