//! Startup requirement validation for perfsight-sampler.
//!
//! Checks that procfs is usable and that the sampler can read itself before
//! the control loop starts accepting commands.

use nix::unistd::geteuid;
use perfsight_sampler::process::{ProcessProbe, ProcfsProbe};
use perfsight_sampler::ProbeError;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    info!("Validating runtime requirements...");

    check_user_privileges();
    check_proc_root(proc_root)?;
    check_self_probe(proc_root)?;

    info!("All runtime requirements validated");
    Ok(())
}

/// Non-root users can only sample their own processes.
fn check_user_privileges() {
    if geteuid().is_root() {
        info!("Running as root (uid=0)");
    } else {
        warn!("Not running as root - processes of other users will report null samples");
    }
}

fn check_proc_root(proc_root: &Path) -> Result<(), ValidationError> {
    match fs::read_dir(proc_root) {
        Ok(_) => {
            info!("{} is readable", proc_root.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!("{} not found - is procfs mounted?", proc_root.display());
            Err(ValidationError::ProcNotMounted(proc_root.display().to_string()))
        }
        Err(e) => {
            error!("Cannot list {}: {}", proc_root.display(), e);
            Err(ValidationError::ProcUnreadable(e.to_string()))
        }
    }
}

/// Opens and reads the sampler's own process through the same probe used for targets.
fn check_self_probe(proc_root: &Path) -> Result<(), ValidationError> {
    let probe = ProcfsProbe::new(proc_root);
    let pid = std::process::id();

    let reading = probe
        .open(pid)
        .and_then(|handle| probe.read(&handle))
        .map_err(ValidationError::SelfProbe)?;

    info!(
        "Self probe ok: cpu={:.2}s memory={}KB",
        reading.cpu_seconds,
        reading.memory_bytes / 1024
    );
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("procfs not found at {0}")]
    ProcNotMounted(String),

    #[error("procfs not readable: {0}")]
    ProcUnreadable(String),

    #[error("cannot sample own process: {0}")]
    SelfProbe(#[source] ProbeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_proc_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("proc");
        match validate_requirements(&missing) {
            Err(ValidationError::ProcNotMounted(path)) => {
                assert!(path.ends_with("proc"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_proc_root_fails_self_probe() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_requirements(dir.path()),
            Err(ValidationError::SelfProbe(ProbeError::Gone(_)))
        ));
    }
}
