//! Events reported by the supervisor

use pulsewarden_host_api::ProcessId;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{DeferredKind, DeferredToken, ProcessIdentity};

/// Result of one best-effort control tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlOutcome {
    /// Whether the sink was asked to suspend (true) or unsuspend (false)
    pub suspend: bool,

    /// Pid of the control tool, or why it could not be started
    pub result: Result<ProcessId, String>,
}

impl ControlOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything the supervisor reports; nothing is returned to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Backend process launched and tracked
    Started { identity: ProcessIdentity },

    /// Backend could not be launched; nothing is tracked
    LaunchFailed { error: String },

    /// Tracked backend process was killed
    Stopped { identity: ProcessIdentity },

    /// Tracked backend process exited on its own
    Exited { identity: ProcessIdentity },

    /// Control tool was invoked for the sink
    ControlInvoked(ControlOutcome),

    /// OS-level suspend sent after the grace period
    ProcessSuspended { identity: ProcessIdentity },

    /// OS-level resume sent
    ProcessResumed { identity: ProcessIdentity },

    /// A kill/suspend/resume signal could not be delivered
    SignalFailed {
        identity: ProcessIdentity,
        signal: &'static str,
        error: String,
    },

    /// A deferred action found the state changed and did nothing
    StaleActionSkipped {
        kind: DeferredKind,
        token: DeferredToken,
    },
}

/// Receives supervisor events
///
/// Called with the supervisor's lock held: implementations must not call
/// back into the supervisor.
pub trait SupervisorObserver: Send + Sync {
    fn on_event(&self, event: &SupervisorEvent);
}

/// Default observer: logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SupervisorObserver for TracingObserver {
    fn on_event(&self, event: &SupervisorEvent) {
        match event {
            SupervisorEvent::Started { identity } => {
                info!(pid = %identity.pid, generation = identity.generation, "Audio backend started");
            }
            SupervisorEvent::LaunchFailed { error } => {
                error!(error = %error, "Audio backend failed to start");
            }
            SupervisorEvent::Stopped { identity } => {
                info!(pid = %identity.pid, generation = identity.generation, "Audio backend stopped");
            }
            SupervisorEvent::Exited { identity } => {
                warn!(pid = %identity.pid, generation = identity.generation, "Audio backend exited on its own");
            }
            SupervisorEvent::ControlInvoked(outcome) => match &outcome.result {
                Ok(pid) => {
                    debug!(pid = %pid, suspend = outcome.suspend, "Control tool invoked");
                }
                Err(error) => {
                    warn!(error = %error, suspend = outcome.suspend, "Control tool invocation failed");
                }
            },
            SupervisorEvent::ProcessSuspended { identity } => {
                info!(pid = %identity.pid, "Audio paused");
            }
            SupervisorEvent::ProcessResumed { identity } => {
                debug!(pid = %identity.pid, "Audio backend process resumed");
            }
            SupervisorEvent::SignalFailed {
                identity,
                signal,
                error,
            } => {
                warn!(pid = %identity.pid, signal = signal, error = %error, "Failed to signal audio backend");
            }
            SupervisorEvent::StaleActionSkipped { kind, token } => {
                debug!(
                    kind = ?kind,
                    pid = %token.identity.pid,
                    transition = token.transition,
                    "Skipping stale deferred action"
                );
            }
        }
    }
}

/// Observer that keeps every event, for tests and diagnostics
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SupervisorEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SupervisorEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl SupervisorObserver for RecordingObserver {
    fn on_event(&self, event: &SupervisorEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_outcome_success() {
        let ok = ControlOutcome {
            suspend: true,
            result: Ok(ProcessId::new(5)),
        };
        let failed = ControlOutcome {
            suspend: false,
            result: Err("no such file".into()),
        };

        assert!(ok.is_success());
        assert!(!failed.is_success());
    }

    #[test]
    fn recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&SupervisorEvent::LaunchFailed { error: "a".into() });
        observer.on_event(&SupervisorEvent::LaunchFailed { error: "b".into() });

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], SupervisorEvent::LaunchFailed { error: "b".into() });
    }
}
