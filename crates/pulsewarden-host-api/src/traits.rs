//! Host collaborator traits

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::{LaunchSpec, ProcessId};

/// Errors from host collaborator operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Signal {signal} to process {pid} failed: {message}")]
    SignalFailed {
        pid: ProcessId,
        signal: &'static str,
        message: String,
    },

    #[error("Process not found: {0}")]
    ProcessNotFound(ProcessId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Starts and signals OS processes
///
/// `kill`, `suspend` and `resume` address a process by the id `exec`
/// returned. Implementations treat an already-exited process as success.
pub trait ProcessLauncher: Send + Sync {
    /// Start a process without waiting for it
    fn exec(&self, spec: &LaunchSpec) -> HostResult<ProcessId>;

    /// Forcibly terminate a process (SIGKILL)
    fn kill(&self, pid: ProcessId) -> HostResult<()>;

    /// Freeze a process's scheduling (SIGSTOP)
    fn suspend(&self, pid: ProcessId) -> HostResult<()>;

    /// Let a frozen process run again (SIGCONT)
    fn resume(&self, pid: ProcessId) -> HostResult<()>;

    /// Whether a process this launcher started under `pid` has not been
    /// reaped yet
    fn is_running(&self, pid: ProcessId) -> bool;
}

/// Materializes the backend's on-disk configuration
pub trait ConfigWriter: Send + Sync {
    /// Create `path` (and parents) with the given permission bits if it does
    /// not exist yet. An existing directory is left untouched.
    fn ensure_dir(&self, path: &Path, mode: u32) -> HostResult<()>;

    /// Write `content` to `path`, replacing any previous content
    fn write_text(&self, path: &Path, content: &str) -> HostResult<()>;
}

/// A callback run once by a [`DeferredScheduler`]
pub type DeferredAction = Box<dyn FnOnce() + Send + 'static>;

/// Runs callbacks once after a delay
///
/// There is no cancellation: whoever schedules an action is responsible
/// for checking, when it runs, whether it still applies.
pub trait DeferredScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, action: DeferredAction);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_error_message() {
        let err = HostError::SignalFailed {
            pid: ProcessId::new(7),
            signal: "SIGSTOP",
            message: "EPERM".into(),
        };
        assert_eq!(err.to_string(), "Signal SIGSTOP to process 7 failed: EPERM");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: HostError = io.into();
        assert!(matches!(err, HostError::Io(_)));
    }
}
