//! Control loop: one JSON command per input line.
//!
//! Commands only ever touch [`SharedConfig`] and the event sink; the sampler
//! picks changes up on its next snapshot.

use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::error::ControlError;
use crate::output::EventSink;
use crate::process::{scan_family, ScanOptions};
use crate::protocol::{parse_command, Command, Event};
use crate::shared::{interval_from_secs, SharedConfig};

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Why the control loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    ExitCommand,
    EndOfInput,
}

pub struct ControlLoop {
    shared: Arc<SharedConfig>,
    sink: EventSink,
    scan: ScanOptions,
    default_interval: Duration,
}

impl ControlLoop {
    pub fn new(
        shared: Arc<SharedConfig>,
        sink: EventSink,
        scan: ScanOptions,
        default_interval: Duration,
    ) -> Self {
        Self {
            shared,
            sink,
            scan,
            default_interval,
        }
    }

    /// Reads commands until `exit` or end-of-input.
    pub async fn run<R>(&self, mut reader: R) -> io::Result<Shutdown>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                info!("Command stream closed");
                return Ok(Shutdown::EndOfInput);
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    debug!("Discarding non-UTF-8 command line: {}", e);
                    continue;
                }
            };

            match self.handle_line(line).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => {
                    info!("Exit command received");
                    return Ok(Shutdown::ExitCommand);
                }
                Err(e) => warn!("Command failed: {}", e),
            }
        }
    }

    /// Parses and applies one line. Unparsable lines are ignored.
    pub async fn handle_line(&self, line: &str) -> Result<Flow, ControlError> {
        match parse_command(line) {
            Some(cmd) => self.apply(cmd).await,
            None => Ok(Flow::Continue),
        }
    }

    pub async fn apply(&self, command: Command) -> Result<Flow, ControlError> {
        match command {
            Command::ScanChrome => {
                let opts = self.scan.clone();
                let data = tokio::task::spawn_blocking(move || scan_family(&opts)).await?;
                debug!("Scan found {} processes", data.len());
                self.sink.send(Event::ProcessList { data }).await?;
            }
            Command::Start { pids, interval } => {
                let interval = interval
                    .map(interval_from_secs)
                    .unwrap_or(self.default_interval);
                info!(
                    "Started collection for pids {:?} every {:.2}s",
                    pids,
                    interval.as_secs_f64()
                );
                self.shared.start(pids, interval);
            }
            Command::Stop => {
                self.shared.set_enabled(false);
                info!("Stopped collection");
            }
            Command::Update { pids, interval } => {
                debug!("Updating collection: pids={:?} interval={:?}", pids, interval);
                self.shared.update(pids, interval.map(interval_from_secs));
            }
            Command::Status => {
                let snap = self.shared.snapshot();
                self.sink
                    .send(Event::Status {
                        running: snap.enabled,
                        pids: snap.targets.into_iter().collect(),
                        interval: snap.interval.as_secs_f64(),
                    })
                    .await?;
            }
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }
}
