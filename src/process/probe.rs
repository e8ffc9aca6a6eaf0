//! Per-process readers used by the sampler.
//!
//! A probe opens a handle once per target and reads cumulative counters from
//! it on every tick. The procfs implementation pins each handle to the
//! process start time, so a recycled pid is reported as gone instead of
//! silently continuing the old baseline.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProbeError;
use crate::process::cpu::{parse_stat, StatFields};
use crate::process::memory::read_memory;

/// Cumulative counters read from one process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    /// User + system CPU time since process start, in seconds.
    pub cpu_seconds: f64,
    /// Private memory when available, else resident set size.
    pub memory_bytes: u64,
}

/// Source of per-process readings.
pub trait ProcessProbe: Send + 'static {
    type Handle: Send;

    /// Resolves a pid into a reusable handle.
    fn open(&self, pid: u32) -> Result<Self::Handle, ProbeError>;

    /// Reads current counters through a previously opened handle.
    fn read(&self, handle: &Self::Handle) -> Result<RawReading, ProbeError>;
}

/// Handle onto `/proc/<pid>`.
#[derive(Debug, Clone)]
pub struct ProcHandle {
    pid: u32,
    path: PathBuf,
    start_ticks: u64,
}

/// Reads processes from a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcfsProbe {
    root: PathBuf,
}

impl Default for ProcfsProbe {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcfsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_stat(pid: u32, path: &Path) -> Result<StatFields, ProbeError> {
        let content =
            fs::read_to_string(path.join("stat")).map_err(|e| ProbeError::from_io(pid, e))?;
        let fields = parse_stat(&content).ok_or_else(|| ProbeError::Malformed {
            pid,
            reason: "invalid stat format".to_string(),
        })?;
        if fields.is_zombie() {
            return Err(ProbeError::Gone(pid));
        }
        Ok(fields)
    }
}

impl ProcessProbe for ProcfsProbe {
    type Handle = ProcHandle;

    fn open(&self, pid: u32) -> Result<ProcHandle, ProbeError> {
        let path = self.root.join(pid.to_string());
        let fields = Self::read_stat(pid, &path)?;
        Ok(ProcHandle {
            pid,
            path,
            start_ticks: fields.start_ticks,
        })
    }

    fn read(&self, handle: &ProcHandle) -> Result<RawReading, ProbeError> {
        let fields = Self::read_stat(handle.pid, &handle.path)?;
        if fields.start_ticks != handle.start_ticks {
            // Same pid, different process
            return Err(ProbeError::Gone(handle.pid));
        }
        let memory = read_memory(&handle.path).map_err(|e| ProbeError::from_io(handle.pid, e))?;
        Ok(RawReading {
            cpu_seconds: fields.cpu_seconds(),
            memory_bytes: memory.reported_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::cpu::CLK_TCK;
    use tempfile::tempdir;

    fn write_proc(root: &Path, pid: u32, state: char, utime: u64, start: u64) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        let stat = format!(
            "{pid} (chrome) {state} 1 {pid} {pid} 0 -1 4194304 0 0 0 0 {utime} 0 0 0 20 0 1 0 {start} 0 0"
        );
        fs::write(dir.join("stat"), stat).unwrap();
        fs::write(dir.join("status"), "VmRSS:\t2048 kB\n").unwrap();
    }

    #[test]
    fn test_open_and_read() {
        let root = tempdir().expect("Failed to create temp dir");
        write_proc(root.path(), 100, 'S', 250, 42);

        let probe = ProcfsProbe::new(root.path());
        let handle = probe.open(100).unwrap();
        assert_eq!(handle.pid, 100);
        assert_eq!(handle.path, root.path().join("100"));

        let reading = probe.read(&handle).unwrap();
        assert!((reading.cpu_seconds - 250.0 / *CLK_TCK).abs() < 1e-9);
        assert_eq!(reading.memory_bytes, 2048 * 1024);
    }

    #[test]
    fn test_open_missing_pid_is_gone() {
        let root = tempdir().expect("Failed to create temp dir");
        let probe = ProcfsProbe::new(root.path());
        assert!(matches!(probe.open(999), Err(ProbeError::Gone(999))));
    }

    #[test]
    fn test_zombie_is_gone() {
        let root = tempdir().expect("Failed to create temp dir");
        write_proc(root.path(), 5, 'Z', 0, 1);
        let probe = ProcfsProbe::new(root.path());
        assert!(matches!(probe.open(5), Err(ProbeError::Gone(5))));
    }

    #[test]
    fn test_pid_reuse_is_detected() {
        let root = tempdir().expect("Failed to create temp dir");
        write_proc(root.path(), 100, 'S', 10, 42);
        let probe = ProcfsProbe::new(root.path());
        let handle = probe.open(100).unwrap();

        // Same pid comes back with a different start time
        write_proc(root.path(), 100, 'S', 1, 77);
        assert!(matches!(probe.read(&handle), Err(ProbeError::Gone(100))));
    }

    #[test]
    fn test_process_exit_between_ticks() {
        let root = tempdir().expect("Failed to create temp dir");
        write_proc(root.path(), 8, 'R', 10, 3);
        let probe = ProcfsProbe::new(root.path());
        let handle = probe.open(8).unwrap();

        fs::remove_dir_all(root.path().join("8")).unwrap();
        let err = probe.read(&handle).unwrap_err();
        assert!(err.is_terminal());
    }

    #[test]
    fn test_malformed_stat() {
        let root = tempdir().expect("Failed to create temp dir");
        let dir = root.path().join("6");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stat"), "6 (x) S 1").unwrap();

        let probe = ProcfsProbe::new(root.path());
        let err = probe.open(6).unwrap_err();
        assert!(matches!(err, ProbeError::Malformed { pid: 6, .. }));
        assert!(!err.is_terminal());
    }
}
