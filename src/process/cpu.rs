//! CPU statistics parsing for process metrics.
//!
//! This module parses cumulative CPU time and start time from
//! `/proc/<pid>/stat` and turns two cumulative readings into a percentage of
//! total machine capacity.

use once_cell::sync::Lazy;
use std::time::Duration;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    // Fallback to common default for error cases or non-Unix platforms
    100.0
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Number of logical CPUs currently online.
pub fn logical_core_count() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_NPROCESSORS_ONLN
        let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if n > 0 {
            return n as usize;
        }
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Fields of `/proc/<pid>/stat` the sampler needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFields {
    /// Single-letter scheduler state (R, S, D, Z, ...).
    pub state: char,
    /// utime + stime, in clock ticks.
    pub cpu_ticks: u64,
    /// Start time after boot, in clock ticks. Stable for the life of a process.
    pub start_ticks: u64,
}

impl StatFields {
    pub fn cpu_seconds(&self) -> f64 {
        self.cpu_ticks as f64 / *CLK_TCK
    }

    pub fn is_zombie(&self) -> bool {
        matches!(self.state, 'Z' | 'X')
    }
}

/// Parses the contents of `/proc/<pid>/stat`.
///
/// The command name (field 2) may itself contain spaces and parentheses, so
/// fields are counted from the last closing parenthesis.
pub fn parse_stat(content: &str) -> Option<StatFields> {
    let rest = &content[content.rfind(')')? + 1..];
    // rest[0] is field 3 (state)
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() < 20 {
        return None;
    }

    let state = parts[0].chars().next()?;
    let utime: u64 = parts[11].parse().ok()?;
    let stime: u64 = parts[12].parse().ok()?;
    let start_ticks: u64 = parts[19].parse().ok()?;

    Some(StatFields {
        state,
        cpu_ticks: utime + stime,
        start_ticks,
    })
}

/// CPU usage over one sampling window, normalized by core count.
///
/// Returns 0 for a non-positive window, a negative CPU delta, or any
/// non-finite intermediate result.
pub fn cpu_percent(cpu_delta_seconds: f64, elapsed: Duration, cores: usize) -> f64 {
    let dt = elapsed.as_secs_f64();
    if dt <= 0.0 || cpu_delta_seconds < 0.0 {
        return 0.0;
    }
    let pct = 100.0 * cpu_delta_seconds / dt / cores.max(1) as f64;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}
