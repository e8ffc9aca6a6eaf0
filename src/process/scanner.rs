//! Process scanning utilities for discovering and classifying browser processes.
//!
//! This module walks the /proc filesystem once, keeps the processes whose
//! name matches the configured executable family, and classifies each one by
//! role from its command line.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, instrument};

use crate::process::classifier::classify;
use crate::process::memory::read_memory;
use crate::protocol::ProcessRecord;

/// Executable names that make up the default target family.
pub const DEFAULT_FAMILY: &[&str] = &["chrome.exe", "google chrome", "chrome"];

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Where and what to scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub proc_root: PathBuf,
    /// Case-insensitive substrings matched against the process name.
    pub family_names: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            family_names: DEFAULT_FAMILY.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Scans the proc root for process entries with numeric PIDs.
pub fn collect_proc_entries(root: &Path) -> Vec<ProcEntry> {
    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let p = entry.path();
            let name = match p.file_name().and_then(|s| s.to_str()) {
                Some(v) => v,
                None => continue,
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let pid: u32 = match name.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            out.push(ProcEntry { pid, proc_path: p });
        }
    }
    out
}

/// Reads process name from comm file or extracts from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    if let Ok(s) = fs::read_to_string(proc_path.join("comm")) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let args = read_cmdline(proc_path);
    let first = args.first()?;
    Path::new(first)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
}

/// Reads the NUL-separated argument vector from cmdline.
/// Kernel threads and unreadable processes yield an empty list.
pub fn read_cmdline(proc_path: &Path) -> Vec<String> {
    match fs::read(proc_path.join("cmdline")) {
        Ok(content) => content
            .split(|&b| b == 0u8)
            .filter(|s| !s.is_empty())
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Case-insensitive substring match against any family name.
pub fn matches_family(name: &str, family: &[String]) -> bool {
    let name = name.to_lowercase();
    family
        .iter()
        .any(|f| !f.is_empty() && name.contains(&f.to_lowercase()))
}

/// Builds a record for one entry, or `None` if it does not belong to the
/// family or vanished mid-scan.
fn scan_entry(entry: &ProcEntry, family: &[String]) -> Option<ProcessRecord> {
    let name = read_process_name(&entry.proc_path)?;
    if !matches_family(&name, family) {
        return None;
    }

    let args = read_cmdline(&entry.proc_path);
    let memory = match read_memory(&entry.proc_path) {
        Ok(m) => m.reported_bytes(),
        Err(e) => {
            debug!("Skipping pid {} during scan: {}", entry.pid, e);
            return None;
        }
    };

    Some(ProcessRecord {
        pid: entry.pid,
        name,
        proc_type: classify(&args),
        memory,
        cpu: 0.0,
    })
}

/// One-shot, classified snapshot of the configured process family, sorted by pid.
#[instrument(skip(opts), fields(root = %opts.proc_root.display()))]
pub fn scan_family(opts: &ScanOptions) -> Vec<ProcessRecord> {
    let start = Instant::now();
    let entries = collect_proc_entries(&opts.proc_root);

    let mut records: Vec<ProcessRecord> = entries
        .par_iter()
        .filter_map(|entry| scan_entry(entry, &opts.family_names))
        .collect();
    records.sort_by_key(|r| r.pid);

    debug!(
        "Scanned {} entries, matched {} in {:.2}ms",
        entries.len(),
        records.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Role;
    use tempfile::tempdir;

    fn family() -> Vec<String> {
        ScanOptions::default().family_names
    }

    fn write_proc(root: &Path, pid: u32, comm: &str, cmdline: &[&str], rss_kb: u64) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
        let mut raw = cmdline.join("\0");
        raw.push('\0');
        fs::write(dir.join("cmdline"), raw).unwrap();
        fs::write(dir.join("status"), format!("VmRSS:\t{rss_kb} kB\n")).unwrap();
    }

    // -------------------------------------------------------------------------
    // Tests for matches_family
    // -------------------------------------------------------------------------

    #[test]
    fn test_matches_family_case_insensitive() {
        let fam = family();
        assert!(matches_family("chrome", &fam));
        assert!(matches_family("Google Chrome Helper", &fam));
        assert!(matches_family("CHROME.EXE", &fam));
        assert!(matches_family("chrome_crashpad", &fam));
        assert!(!matches_family("firefox", &fam));
        assert!(!matches_family("bash", &fam));
    }

    #[test]
    fn test_matches_family_ignores_empty_patterns() {
        assert!(!matches_family("anything", &[String::new()]));
        assert!(!matches_family("chrome", &[]));
    }

    // -------------------------------------------------------------------------
    // Tests for read_process_name / read_cmdline
    // -------------------------------------------------------------------------

    #[test]
    fn test_read_process_name_falls_back_to_cmdline() {
        let root = tempdir().expect("Failed to create temp dir");
        let dir = root.path().join("12");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cmdline"), "/opt/google/chrome/chrome\0--type=gpu-process\0").unwrap();

        assert_eq!(read_process_name(&dir).as_deref(), Some("chrome"));
        assert_eq!(read_cmdline(&dir), vec!["/opt/google/chrome/chrome", "--type=gpu-process"]);
    }

    #[test]
    fn test_collect_proc_entries_skips_non_numeric() {
        let root = tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(root.path().join("1")).unwrap();
        fs::create_dir_all(root.path().join("self")).unwrap();
        fs::create_dir_all(root.path().join("sys")).unwrap();
        fs::create_dir_all(root.path().join("250")).unwrap();

        let mut pids: Vec<u32> = collect_proc_entries(root.path()).iter().map(|e| e.pid).collect();
        pids.sort_unstable();
        assert_eq!(pids, vec![1, 250]);
    }

    // -------------------------------------------------------------------------
    // Tests for scan_family
    // -------------------------------------------------------------------------

    #[test]
    fn test_scan_family_classifies_and_filters() {
        let root = tempdir().expect("Failed to create temp dir");
        let p = root.path();
        write_proc(p, 100, "chrome", &["/opt/google/chrome/chrome"], 1000);
        write_proc(p, 101, "chrome", &["chrome", "--type=renderer"], 200);
        write_proc(p, 102, "chrome", &["chrome", "--type=renderer", "--extension-process"], 300);
        write_proc(p, 103, "chrome", &["chrome", "--type=gpu-process"], 400);
        write_proc(p, 104, "chrome", &["chrome", "--type=zygote"], 50);
        write_proc(p, 200, "bash", &["/bin/bash"], 10);

        let opts = ScanOptions {
            proc_root: p.to_path_buf(),
            family_names: family(),
        };
        let records = scan_family(&opts);

        let summary: Vec<(u32, Role)> = records.iter().map(|r| (r.pid, r.proc_type.clone())).collect();
        assert_eq!(
            summary,
            vec![
                (100, Role::Browser),
                (101, Role::Renderer),
                (102, Role::Extension),
                (103, Role::Gpu),
                (104, Role::Other("Zygote".into())),
            ]
        );
        assert_eq!(records[0].memory, 1000 * 1024);
        assert!(records.iter().all(|r| r.cpu == 0.0));
    }

    #[test]
    fn test_scan_family_skips_vanished_processes() {
        let root = tempdir().expect("Failed to create temp dir");
        // comm present but no status/statm: process exited mid-scan
        let dir = root.path().join("300");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("comm"), "chrome\n").unwrap();

        let opts = ScanOptions {
            proc_root: root.path().to_path_buf(),
            family_names: family(),
        };
        assert!(scan_family(&opts).is_empty());
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let opts = ScanOptions {
            proc_root: PathBuf::from("/nonexistent/proc/root"),
            family_names: family(),
        };
        assert!(scan_family(&opts).is_empty());
    }
}
