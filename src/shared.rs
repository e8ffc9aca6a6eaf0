//! Sampling configuration shared between the control loop and the sampler.
//!
//! A single mutex guards the enabled flag, the target set and the interval.
//! Every operation holds the lock only long enough to copy those values, so
//! the sampler never samples while holding it.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Lower bound applied to every interval write.
pub const MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Interval used before the first `start`.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Consistent copy of the shared configuration, taken once per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub enabled: bool,
    pub targets: BTreeSet<u32>,
    pub interval: Duration,
}

#[derive(Debug)]
struct Settings {
    enabled: bool,
    targets: BTreeSet<u32>,
    interval: Duration,
}

/// Mutable control surface for the sampler.
#[derive(Debug)]
pub struct SharedConfig {
    inner: Mutex<Settings>,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl SharedConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Mutex::new(Settings {
                enabled: false,
                targets: BTreeSet::new(),
                interval: clamp_interval(interval),
            }),
        }
    }

    // A panic while holding the lock cannot leave the three plain fields
    // half-written, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Settings> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    pub fn set_targets<I>(&self, targets: I)
    where
        I: IntoIterator<Item = u32>,
    {
        let targets: BTreeSet<u32> = targets.into_iter().collect();
        self.lock().targets = targets;
    }

    pub fn set_interval(&self, interval: Duration) {
        self.lock().interval = clamp_interval(interval);
    }

    /// Replaces targets and interval and enables sampling in one step.
    pub fn start<I>(&self, targets: I, interval: Duration)
    where
        I: IntoIterator<Item = u32>,
    {
        let targets: BTreeSet<u32> = targets.into_iter().collect();
        let mut settings = self.lock();
        settings.targets = targets;
        settings.interval = clamp_interval(interval);
        settings.enabled = true;
    }

    /// Replaces only the fields that are present.
    pub fn update(&self, targets: Option<Vec<u32>>, interval: Option<Duration>) {
        let targets: Option<BTreeSet<u32>> = targets.map(|t| t.into_iter().collect());
        let mut settings = self.lock();
        if let Some(targets) = targets {
            settings.targets = targets;
        }
        if let Some(interval) = interval {
            settings.interval = clamp_interval(interval);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let settings = self.lock();
        Snapshot {
            enabled: settings.enabled,
            targets: settings.targets.clone(),
            interval: settings.interval,
        }
    }
}

/// Raises intervals below [`MIN_INTERVAL`] to the minimum.
pub fn clamp_interval(interval: Duration) -> Duration {
    interval.max(MIN_INTERVAL)
}

/// Converts a wire interval in seconds. Negative, NaN and overflowing values
/// fall back to the minimum.
pub fn interval_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs)
        .map(clamp_interval)
        .unwrap_or(MIN_INTERVAL)
}
