//! Process-related modules for CPU, memory, probing and classification.
//!
//! This module provides:
//! - `cpu`: CPU time parsing and percentage normalization
//! - `memory`: private/resident memory parsing
//! - `probe`: per-target handles used by the sampler
//! - `scanner`: one-shot process family discovery
//! - `classifier`: role classification from launch arguments

pub mod classifier;
pub mod cpu;
pub mod memory;
pub mod probe;
pub mod scanner;

// Re-export commonly used types
pub use classifier::{classify, Role};
pub use cpu::{cpu_percent, logical_core_count, parse_stat, StatFields, CLK_TCK};
pub use memory::{read_memory, MemoryUsage};
pub use probe::{ProcHandle, ProcessProbe, ProcfsProbe, RawReading};
pub use scanner::{
    collect_proc_entries, matches_family, read_cmdline, read_process_name, scan_family,
    ScanOptions, DEFAULT_FAMILY,
};
