//! Serialized event stream.
//!
//! The sampler and the control loop both hold an [`EventSink`]; a single
//! writer task drains the channel and writes one JSON object per line, so
//! events from the two producers never interleave mid-record.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::OutputError;
use crate::protocol::Event;

/// Default bound of the event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Producer handle for the event stream.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Event>,
}

/// Consumer side, owned by [`run_writer`].
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Event>,
}

/// Creates a bounded event channel.
pub fn channel(capacity: usize) -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSink { tx }, EventStream { rx })
}

impl EventSink {
    /// Queues an event. Fails once the writer has stopped.
    pub async fn send(&self, event: Event) -> Result<(), OutputError> {
        self.tx.send(event).await.map_err(|_| OutputError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl EventStream {
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Encodes one event as a newline-terminated JSON record.
pub fn encode_line(event: &Event) -> Result<Vec<u8>, OutputError> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    Ok(line)
}

/// Writes events until every sink is dropped. A write failure ends the task
/// with an error; dropping the receiver then fails every later `send`.
pub async fn run_writer<W>(mut stream: EventStream, mut writer: W) -> Result<(), OutputError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = stream.recv().await {
        let line = encode_line(&event)?;
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    debug!("All event producers closed, writer exiting");
    Ok(())
}
