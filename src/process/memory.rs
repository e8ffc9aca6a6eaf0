//! Memory parsing utilities for reading process memory metrics from /proc.
//!
//! Private memory (`Private_Clean + Private_Dirty`) comes from
//! `/proc/<pid>/smaps_rollup`, or from the full `smaps` on kernels without
//! the rollup. Resident set size comes from `/proc/<pid>/status`, with
//! `statm` as a fallback, and is used when the maps are not readable.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;

/// Buffer size used for smaps parsing.
const SMAPS_BUFFER_KB: usize = 256;

fn get_page_size() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        unsafe {
            let size = libc::sysconf(libc::_SC_PAGESIZE);
            if size > 0 {
                return size as u64;
            }
        }
    }
    4096
}

/// System page size in bytes.
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

/// Memory counters for one process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub rss: u64,
    /// `None` when the maps could not be read (other user's process, kernel thread).
    pub private: Option<u64>,
}

impl MemoryUsage {
    /// Most specific counter available: private memory, else resident.
    pub fn reported_bytes(&self) -> u64 {
        self.private.unwrap_or(self.rss)
    }
}

/// Parses kilobyte values from smaps/status file lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Sums `Private_Clean` and `Private_Dirty` over any smaps-format file.
/// Works for both `smaps_rollup` (one block) and `smaps` (one block per mapping).
pub fn parse_private_bytes(path: &Path) -> Result<u64, io::Error> {
    let file = fs::File::open(path)?;
    let reader = BufReader::with_capacity(SMAPS_BUFFER_KB * 1024, file);

    let mut private_kb = 0u64;
    for line in reader.lines() {
        let l = line?;
        if let Some(v) = l
            .strip_prefix("Private_Clean:")
            .or_else(|| l.strip_prefix("Private_Dirty:"))
        {
            private_kb += parse_kb_value(v).unwrap_or(0);
        }
    }

    Ok(private_kb * 1024)
}

/// Reads private memory, preferring the fast `smaps_rollup` (Linux >= 4.14).
pub fn read_private_bytes(proc_path: &Path) -> Result<u64, io::Error> {
    let rollup = proc_path.join("smaps_rollup");
    match parse_private_bytes(&rollup) {
        Err(e) if e.kind() == io::ErrorKind::NotFound && proc_path.exists() => {
            parse_private_bytes(&proc_path.join("smaps"))
        }
        other => other,
    }
}

/// Reads resident set size from `status` (VmRSS), falling back to `statm`.
/// Kernel threads have no VmRSS line and report 0.
pub fn read_rss_bytes(proc_path: &Path) -> Result<u64, io::Error> {
    match fs::read_to_string(proc_path.join("status")) {
        Ok(content) => {
            for line in content.lines() {
                if let Some(v) = line.strip_prefix("VmRSS:") {
                    if let Some(kb) = parse_kb_value(v) {
                        return Ok(kb * 1024);
                    }
                }
            }
            Ok(0)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let statm = fs::read_to_string(proc_path.join("statm"))?;
            let pages: u64 = statm
                .split_whitespace()
                .nth(1)
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| io::Error::other("Invalid statm format"))?;
            Ok(pages * *PAGE_SIZE)
        }
        Err(e) => Err(e),
    }
}

/// Reads RSS and, where permitted, private memory.
///
/// RSS failures propagate (the process is gone or unreadable). Private memory
/// read failures only drop to the RSS fallback.
pub fn read_memory(proc_path: &Path) -> Result<MemoryUsage, io::Error> {
    let rss = read_rss_bytes(proc_path)?;
    let private = match read_private_bytes(proc_path) {
        // An empty rollup (kernel thread) carries no information
        Ok(0) => None,
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::trace!("Private memory unavailable for {}: {}", proc_path.display(), e);
            None
        }
    };
    Ok(MemoryUsage { rss, private })
}
