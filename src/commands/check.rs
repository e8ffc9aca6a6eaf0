//! Check command implementation.
//!
//! Validates system requirements and configuration.

use perfsight_sampler::process::{collect_proc_entries, logical_core_count, read_memory, CLK_TCK};

use crate::config::{validate_effective_config, Config};
use crate::startup_checks::validate_requirements;

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("PerfSight Sampler - System Check");
    println!("================================");

    let mut all_ok = true;
    let proc_root = config.proc_root();

    println!("\nChecking {} ...", proc_root.display());
    let entries = collect_proc_entries(&proc_root);
    if entries.is_empty() {
        println!("   [FAIL] Cannot read any process entries");
        all_ok = false;
    } else {
        println!("   [ OK ] Can read {} process entries", entries.len());
    }

    println!("\nChecking runtime requirements...");
    match validate_requirements(&proc_root) {
        Ok(()) => println!("   [ OK ] Own process can be sampled"),
        Err(e) => {
            println!("   [FAIL] {}", e);
            all_ok = false;
        }
    }

    println!("\nChecking memory accounting...");
    let self_path = proc_root.join(std::process::id().to_string());
    match read_memory(&self_path) {
        Ok(usage) => match usage.private {
            Some(private) => println!(
                "   [ OK ] Private memory available: {}KB (RSS {}KB)",
                private / 1024,
                usage.rss / 1024
            ),
            None => println!(
                "   [WARN] smaps not readable, falling back to RSS: {}KB",
                usage.rss / 1024
            ),
        },
        Err(e) => {
            println!("   [FAIL] Memory read failed: {}", e);
            all_ok = false;
        }
    }

    println!("\nHost:");
    println!("   Logical cores: {}", logical_core_count());
    println!("   Clock ticks/s: {}", *CLK_TCK);

    println!("\nChecking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   [ OK ] Configuration is valid"),
        Err(e) => {
            println!("   [FAIL] Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\nSummary:");
    if all_ok {
        println!("   All checks passed - sampler is ready");
        Ok(())
    } else {
        println!("   Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
