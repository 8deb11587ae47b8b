//! Supervised process state and deferred-action tokens

use pulsewarden_host_api::ProcessId;
use std::fmt;

/// Identity of one launched backend process
///
/// `generation` counts successful launches, so a pid the OS hands out again
/// after the original process died never compares equal to the old identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub generation: u64,
    pub pid: ProcessId,
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.pid, self.generation)
    }
}

/// Externally visible lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Stopped,
    Running,
    RunningPaused,
}

/// Second half of a pause or resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredKind {
    /// OS-level suspend after the sink was logically suspended
    SuspendProcess,
    /// Logical sink unsuspend after the process was resumed
    UnsuspendSink,
}

/// Snapshot taken when a deferred action is scheduled
///
/// The action may only run if the state still matches the snapshot exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredToken {
    pub identity: ProcessIdentity,
    pub paused: bool,
    pub transition: u64,
}

/// The single supervised process, guarded by the supervisor's lock
#[derive(Debug, Default)]
pub struct ProcessState {
    current: Option<ProcessIdentity>,
    paused: bool,
    generation: u64,
    /// Bumped on every lifecycle transition
    transition: u64,
}

impl ProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ProcessIdentity> {
        self.current
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn lifecycle(&self) -> SupervisorState {
        match (self.current, self.paused) {
            (None, _) => SupervisorState::Stopped,
            (Some(_), false) => SupervisorState::Running,
            (Some(_), true) => SupervisorState::RunningPaused,
        }
    }

    /// Track a freshly launched process
    pub fn begin(&mut self, pid: ProcessId) -> ProcessIdentity {
        self.generation += 1;
        let identity = ProcessIdentity {
            generation: self.generation,
            pid,
        };
        self.current = Some(identity);
        self.paused = false;
        self.transition += 1;
        identity
    }

    /// Forget the current process, if any, and clear the paused flag
    pub fn clear(&mut self) -> Option<ProcessIdentity> {
        self.paused = false;
        self.transition += 1;
        self.current.take()
    }

    /// Set the paused flag and return the token for the follow-up action
    ///
    /// Returns `None` when no process is tracked.
    pub fn set_paused(&mut self, paused: bool) -> Option<DeferredToken> {
        let identity = self.current?;
        self.paused = paused;
        self.transition += 1;
        Some(DeferredToken {
            identity,
            paused,
            transition: self.transition,
        })
    }

    /// Whether nothing has happened since `token` was taken
    pub fn matches(&self, token: &DeferredToken) -> bool {
        self.current == Some(token.identity)
            && self.paused == token.paused
            && self.transition == token.transition
    }
}
