//! Error types shared by the sampler, control loop and output channel.

use std::io;

/// Failure to read a single target process.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("process {0} no longer exists")]
    Gone(u32),

    #[error("access denied to process {0}")]
    AccessDenied(u32),

    #[error("malformed procfs data for process {pid}: {reason}")]
    Malformed { pid: u32, reason: String },

    #[error("I/O error reading process {pid}: {source}")]
    Io {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    /// Maps an I/O error from a procfs read onto the probe taxonomy.
    pub fn from_io(pid: u32, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ProbeError::Gone(pid),
            io::ErrorKind::PermissionDenied => ProbeError::AccessDenied(pid),
            // ESRCH surfaces when the task exits between open() and read()
            _ if err.raw_os_error() == Some(libc::ESRCH) => ProbeError::Gone(pid),
            _ => ProbeError::Io { pid, source: err },
        }
    }

    /// Gone and access-denied targets have their sampling state purged.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProbeError::Gone(_) | ProbeError::AccessDenied(_))
    }
}

/// Failure of the serialized event stream. Always fatal to the sampler.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("event channel closed")]
    Closed,

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write event: {0}")]
    Write(#[from] io::Error),
}

/// Fault raised while applying a single command.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("process scan task failed: {0}")]
    Scan(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_not_found_to_gone() {
        let err = ProbeError::from_io(42, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ProbeError::Gone(42)));
        assert!(err.is_terminal());
    }

    #[test]
    fn test_from_io_maps_permission_denied() {
        let err = ProbeError::from_io(7, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ProbeError::AccessDenied(7)));
        assert!(err.is_terminal());
    }

    #[test]
    fn test_from_io_maps_esrch_to_gone() {
        let err = ProbeError::from_io(9, io::Error::from_raw_os_error(libc::ESRCH));
        assert!(matches!(err, ProbeError::Gone(9)));
    }

    #[test]
    fn test_other_io_errors_are_not_terminal() {
        let err = ProbeError::from_io(3, io::Error::other("boom"));
        assert!(matches!(err, ProbeError::Io { pid: 3, .. }));
        assert!(!err.is_terminal());
    }
}
