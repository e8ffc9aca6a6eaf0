//! Integration tests for the event stream writer.
//!
//! Verifies the JSON line format seen by consumers and that a broken output
//! makes every producer fail.

use perfsight_sampler::output::{self, encode_line, run_writer};
use perfsight_sampler::process::Role;
use perfsight_sampler::{Event, MetricSample, OutputError, ProcessRecord};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

/// Writer that rejects every write, like a closed stdout pipe.
struct BrokenPipe;

impl AsyncWrite for BrokenPipe {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn parse(event: &Event) -> Value {
    serde_json::from_slice(&encode_line(event).unwrap()).unwrap()
}

#[test]
fn test_data_event_wire_shape() {
    let mut metrics = BTreeMap::new();
    metrics.insert(100, Some(MetricSample::new(6.25, 3 * 1024 * 1024)));
    metrics.insert(200, None);

    let value = parse(&Event::Data {
        timestamp: 1_700_000_000_000,
        metrics,
    });
    assert_eq!(
        value,
        json!({
            "type": "data",
            "timestamp": 1_700_000_000_000_i64,
            "metrics": {
                "100": {"cpu": 6.25, "memory": 3.0},
                "200": null
            }
        })
    );
}

#[test]
fn test_process_list_wire_shape() {
    let value = parse(&Event::ProcessList {
        data: vec![ProcessRecord {
            pid: 42,
            name: "chrome".to_string(),
            proc_type: Role::Gpu,
            memory: 4096,
            cpu: 0.0,
        }],
    });
    assert_eq!(
        value,
        json!({
            "type": "process_list",
            "data": [
                {"pid": 42, "name": "chrome", "proc_type": "GPU", "memory": 4096, "cpu": 0.0}
            ]
        })
    );
}

#[tokio::test]
async fn test_writer_emits_one_line_per_event() {
    let (sink, stream) = output::channel(4);
    let mut out = Vec::new();

    let producer = tokio::spawn(async move {
        for running in [true, false] {
            sink.send(Event::Status {
                running,
                pids: vec![1],
                interval: 1.0,
            })
            .await
            .unwrap();
        }
    });

    run_writer(stream, &mut out).await.unwrap();
    producer.await.unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["running"], json!(true));
    assert_eq!(lines[1]["running"], json!(false));
}

#[tokio::test]
async fn test_write_failure_closes_stream() {
    let (sink, stream) = output::channel(4);
    sink.send(Event::ProcessList { data: vec![] })
        .await
        .unwrap();

    let result = run_writer(stream, BrokenPipe).await;
    assert!(matches!(result, Err(OutputError::Write(_))));

    assert!(sink.is_closed());
    assert!(matches!(
        sink.send(Event::ProcessList { data: vec![] }).await,
        Err(OutputError::Closed)
    ));
}
