//! Sampler loop and its per-target state.
//!
//! The sampler owns the [`SamplingStore`] outright; nothing else reads or
//! writes it, so it needs no synchronization. Each tick it prunes the store
//! against the configured targets, reads every target through a cached
//! handle and computes CPU usage from explicitly tracked baselines.

use ahash::AHashMap as HashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::OutputError;
use crate::output::EventSink;
use crate::process::{cpu_percent, ProcessProbe};
use crate::protocol::{Event, MetricSample};
use crate::shared::SharedConfig;

/// Sleep between snapshots while sampling is disabled.
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(100);

/// Wall time and cumulative CPU seconds of the previous reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub at: Instant,
    pub cpu_seconds: f64,
}

#[derive(Debug)]
struct StateEntry<H> {
    handle: H,
    baseline: Option<Baseline>,
}

/// Cached handles and baselines, keyed by pid.
#[derive(Debug)]
pub struct SamplingStore<H> {
    entries: HashMap<u32, StateEntry<H>>,
}

impl<H> Default for SamplingStore<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H> SamplingStore<H> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn baseline(&self, pid: u32) -> Option<Baseline> {
        self.entries.get(&pid).and_then(|e| e.baseline)
    }

    /// Drops every entry whose pid is not in `targets`.
    pub fn prune(&mut self, targets: &BTreeSet<u32>) {
        self.entries.retain(|pid, _| targets.contains(pid));
    }

    pub fn remove(&mut self, pid: u32) {
        self.entries.remove(&pid);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Measures a set of targets through a [`ProcessProbe`].
pub struct Sampler<P: ProcessProbe> {
    probe: P,
    store: SamplingStore<P::Handle>,
    cores: usize,
}

impl<P: ProcessProbe> Sampler<P> {
    pub fn new(probe: P, cores: usize) -> Self {
        Self {
            probe,
            store: SamplingStore::default(),
            cores: cores.max(1),
        }
    }

    pub fn store(&self) -> &SamplingStore<P::Handle> {
        &self.store
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    /// Disabled-branch housekeeping: state of still-configured targets
    /// survives a pause, everything else is dropped.
    pub fn idle(&mut self, targets: &BTreeSet<u32>) {
        let before = self.store.len();
        self.store.prune(targets);
        if self.store.len() != before {
            debug!("Dropped sampling state for {} targets", before - self.store.len());
        }
    }

    /// Samples every target once. Unsampleable targets map to `None`.
    pub fn tick(
        &mut self,
        targets: &BTreeSet<u32>,
        now: Instant,
    ) -> BTreeMap<u32, Option<MetricSample>> {
        self.store.prune(targets);
        targets
            .iter()
            .map(|&pid| (pid, self.sample_one(pid, now)))
            .collect()
    }

    fn sample_one(&mut self, pid: u32, now: Instant) -> Option<MetricSample> {
        if !self.store.contains(pid) {
            match self.probe.open(pid) {
                Ok(handle) => {
                    self.store.entries.insert(
                        pid,
                        StateEntry {
                            handle,
                            baseline: None,
                        },
                    );
                }
                Err(e) => {
                    debug!("Cannot open target: {}", e);
                    return None;
                }
            }
        }

        let entry = self.store.entries.get_mut(&pid)?;
        match self.probe.read(&entry.handle) {
            Ok(reading) => {
                let cpu = match entry.baseline {
                    Some(prev) => cpu_percent(
                        reading.cpu_seconds - prev.cpu_seconds,
                        now.saturating_duration_since(prev.at),
                        self.cores,
                    ),
                    None => 0.0,
                };
                entry.baseline = Some(Baseline {
                    at: now,
                    cpu_seconds: reading.cpu_seconds,
                });
                Some(MetricSample::new(cpu, reading.memory_bytes))
            }
            Err(e) if e.is_terminal() => {
                debug!("Target lost, resetting state: {}", e);
                self.store.remove(pid);
                None
            }
            Err(e) => {
                warn!("Failed to sample target: {}", e);
                None
            }
        }
    }
}

/// Builds the tick's event, or `None` when no target produced a sample.
pub fn build_event(timestamp_ms: i64, metrics: BTreeMap<u32, Option<MetricSample>>) -> Option<Event> {
    if metrics.values().any(Option::is_some) {
        Some(Event::Data {
            timestamp: timestamp_ms,
            metrics,
        })
    } else {
        None
    }
}

/// Runs the sampler until the event sink closes.
pub async fn run_sampler<P: ProcessProbe>(
    mut sampler: Sampler<P>,
    shared: Arc<SharedConfig>,
    sink: EventSink,
    idle_poll: Duration,
) -> Result<(), OutputError> {
    info!("Sampler started ({} logical cores)", sampler.cores());

    loop {
        let snap = shared.snapshot();

        if !snap.enabled {
            sampler.idle(&snap.targets);
            tokio::time::sleep(idle_poll).await;
            continue;
        }

        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let metrics = sampler.tick(&snap.targets, Instant::now());

        if let Some(event) = build_event(timestamp_ms, metrics) {
            if let Err(e) = sink.send(event).await {
                warn!("Event stream closed, stopping sampler");
                return Err(e);
            }
        }

        tokio::time::sleep(snap.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_event_requires_a_sample() {
        let mut metrics = BTreeMap::new();
        metrics.insert(1, None);
        metrics.insert(2, None);
        assert!(build_event(0, metrics.clone()).is_none());

        metrics.insert(3, Some(MetricSample::new(0.0, 0)));
        match build_event(10, metrics) {
            Some(Event::Data { timestamp, metrics }) => {
                assert_eq!(timestamp, 10);
                assert_eq!(metrics.len(), 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_build_event_empty_tick() {
        assert!(build_event(0, BTreeMap::new()).is_none());
    }

    #[test]
    fn test_store_prune_and_clear() {
        let mut store: SamplingStore<()> = SamplingStore::default();
        for pid in [1, 2, 3] {
            store.entries.insert(
                pid,
                StateEntry {
                    handle: (),
                    baseline: None,
                },
            );
        }

        let keep: BTreeSet<u32> = [2, 3, 9].into_iter().collect();
        store.prune(&keep);
        assert!(!store.contains(1));
        assert!(store.contains(2) && store.contains(3));
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }
}
