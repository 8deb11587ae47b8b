//! Audio backend supervisor
//!
//! Owns the one audio server process and serializes every lifecycle
//! transition behind a single lock.
//!
//! Pausing and resuming happen in two phases. Pause first asks the server to
//! suspend its sink, then after [`GRACE_PERIOD`] freezes the process with
//! SIGSTOP. Resume first sends SIGCONT, then after the grace period asks the
//! server to unsuspend the sink. The second phase runs on the deferred
//! scheduler and carries a [`DeferredToken`]; if any start/stop/pause/resume
//! happened in between, the token no longer matches and the phase is skipped.

use pulsewarden_config::{AudioSettings, BackendPaths};
use pulsewarden_host_api::{
    ConfigWriter, DeferredScheduler, HostResult, ProcessId, ProcessLauncher,
};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tracing::{debug, info};

use crate::command::{
    backend_launch, config_path, control_launch, render_config, SocketEndpoint, WORKING_DIR_MODE,
};
use crate::{
    ControlOutcome, DeferredKind, DeferredToken, ProcessIdentity, ProcessState, SupervisorEvent,
    SupervisorObserver, SupervisorState, TracingObserver,
};

/// Delay between the first and second phase of pause/resume
pub const GRACE_PERIOD: Duration = Duration::from_millis(200);

/// The platform pieces a supervisor drives
#[derive(Clone)]
pub struct Collaborators {
    pub launcher: Arc<dyn ProcessLauncher>,
    pub config_writer: Arc<dyn ConfigWriter>,
    pub scheduler: Arc<dyn DeferredScheduler>,
    pub observer: Arc<dyn SupervisorObserver>,
}

impl Collaborators {
    /// Collaborators reporting through [`TracingObserver`]
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        config_writer: Arc<dyn ConfigWriter>,
        scheduler: Arc<dyn DeferredScheduler>,
    ) -> Self {
        Self {
            launcher,
            config_writer,
            scheduler,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SupervisorObserver>) -> Self {
        self.observer = observer;
        self
    }
}

/// Supervises the single audio backend process
///
/// Construct one per host and hand out clones; clones share the same state
/// and lock. No method returns an error: failures are reported to the
/// observer and the supervisor falls back to "not running".
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
}

struct Shared {
    paths: BackendPaths,
    socket: SocketEndpoint,
    collaborators: Collaborators,
    guarded: Mutex<Guarded>,
}

struct Guarded {
    process: ProcessState,
    settings: AudioSettings,
}

impl Supervisor {
    pub fn new(paths: BackendPaths, socket: SocketEndpoint, collaborators: Collaborators) -> Self {
        Self {
            shared: Arc::new(Shared {
                paths,
                socket,
                collaborators,
                guarded: Mutex::new(Guarded {
                    process: ProcessState::new(),
                    settings: AudioSettings::default(),
                }),
            }),
        }
    }

    /// Use `settings` instead of the defaults for the first start
    pub fn with_settings(self, settings: AudioSettings) -> Self {
        self.shared.lock().settings = settings;
        self
    }

    /// Stop any running backend, write a fresh config and launch a new one
    pub fn start(&self) {
        debug!("Starting audio backend");
        let mut guarded = self.shared.lock();

        self.shared.stop_locked(&mut guarded);

        match self.shared.launch_backend(&guarded.settings) {
            Ok(pid) => {
                let identity = guarded.process.begin(pid);
                self.shared.emit(SupervisorEvent::Started { identity });
            }
            Err(e) => {
                self.shared.emit(SupervisorEvent::LaunchFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    /// Kill the running backend, if any. Always clears the paused flag.
    pub fn stop(&self) {
        debug!("Stopping audio backend");
        let mut guarded = self.shared.lock();
        self.shared.stop_locked(&mut guarded);
    }

    /// Suspend the sink now and freeze the process after the grace period
    ///
    /// Does nothing unless a process is running and not already paused.
    pub fn pause(&self) {
        debug!("Pausing audio backend");
        let token = {
            let mut guarded = self.shared.lock();
            if guarded.process.current().is_none() || guarded.process.is_paused() {
                debug!(state = ?guarded.process.lifecycle(), "Nothing to pause");
                return;
            }

            self.shared.invoke_control(true);
            guarded.process.set_paused(true)
        };

        if let Some(token) = token {
            self.schedule(DeferredKind::SuspendProcess, token);
        }
    }

    /// Unfreeze the process now and unsuspend the sink after the grace period
    ///
    /// Does nothing unless a process is running and paused.
    pub fn resume(&self) {
        debug!("Resuming audio backend");
        let token = {
            let mut guarded = self.shared.lock();
            let Some(identity) = guarded.process.current() else {
                debug!("Nothing to resume");
                return;
            };
            if !guarded.process.is_paused() {
                debug!("Audio backend is not paused");
                return;
            }

            match self.shared.collaborators.launcher.resume(identity.pid) {
                Ok(()) => self.shared.emit(SupervisorEvent::ProcessResumed { identity }),
                Err(e) => self.shared.signal_failed(identity, "SIGCONT", e.to_string()),
            }
            guarded.process.set_paused(false)
        };

        if let Some(token) = token {
            self.schedule(DeferredKind::UnsuspendSink, token);
        }
    }

    /// Gain used from the next start on
    pub fn set_volume(&self, volume: f32) {
        self.shared.lock().settings.volume = volume;
    }

    /// Performance mode used from the next start on
    pub fn set_performance_mode(&self, mode: u8) {
        self.shared.lock().settings.performance_mode = mode;
    }

    /// Forget the backend if `pid` is the tracked process and it has exited
    ///
    /// An exit report for a pid the launcher still considers running belongs
    /// to an earlier process that had the same pid, and is ignored. Returns
    /// whether the tracked process was cleared.
    pub fn notify_exited(&self, pid: ProcessId) -> bool {
        let mut guarded = self.shared.lock();
        match guarded.process.current() {
            Some(identity) if identity.pid == pid => {
                if self.shared.collaborators.launcher.is_running(pid) {
                    debug!(pid = %pid, "Exit reported for a reused pid, keeping backend");
                    return false;
                }
                guarded.process.clear();
                self.shared.emit(SupervisorEvent::Exited { identity });
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.shared.lock().process.lifecycle()
    }

    pub fn current_pid(&self) -> Option<ProcessId> {
        self.shared.lock().process.current().map(|identity| identity.pid)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().process.is_paused()
    }

    pub fn settings(&self) -> AudioSettings {
        self.shared.lock().settings
    }

    pub fn socket(&self) -> &SocketEndpoint {
        &self.shared.socket
    }

    fn schedule(&self, kind: DeferredKind, token: DeferredToken) {
        // Weak so a dropped supervisor turns pending actions into no-ops
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        self.shared.collaborators.scheduler.schedule(
            GRACE_PERIOD,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.run_deferred(kind, token);
                }
            }),
        );
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Guarded> {
        self.guarded.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: SupervisorEvent) {
        self.collaborators.observer.on_event(&event);
    }

    fn signal_failed(&self, identity: ProcessIdentity, signal: &'static str, error: String) {
        self.emit(SupervisorEvent::SignalFailed {
            identity,
            signal,
            error,
        });
    }

    fn stop_locked(&self, guarded: &mut Guarded) {
        if let Some(identity) = guarded.process.clear() {
            match self.collaborators.launcher.kill(identity.pid) {
                Ok(()) => self.emit(SupervisorEvent::Stopped { identity }),
                Err(e) => self.signal_failed(identity, "SIGKILL", e.to_string()),
            }
        }
    }

    fn ensure_working_dir(&self) -> HostResult<()> {
        self.collaborators
            .config_writer
            .ensure_dir(&self.paths.working_dir, WORKING_DIR_MODE)
    }

    fn launch_backend(&self, settings: &AudioSettings) -> HostResult<ProcessId> {
        self.ensure_working_dir()?;

        let config = render_config(&self.socket, settings);
        self.collaborators
            .config_writer
            .write_text(&config_path(&self.paths), &config)?;

        let spec = backend_launch(&self.paths);
        info!(command = %spec.command_line(), "Launching audio backend");
        self.collaborators.launcher.exec(&spec)
    }

    fn invoke_control(&self, suspend: bool) {
        let result = self.ensure_working_dir().and_then(|()| {
            let spec = control_launch(&self.paths, &self.socket, suspend);
            self.collaborators.launcher.exec(&spec)
        });

        self.emit(SupervisorEvent::ControlInvoked(ControlOutcome {
            suspend,
            result: result.map_err(|e| e.to_string()),
        }));
    }

    fn run_deferred(&self, kind: DeferredKind, token: DeferredToken) {
        let guarded = self.lock();
        if !guarded.process.matches(&token) {
            self.emit(SupervisorEvent::StaleActionSkipped { kind, token });
            return;
        }

        let identity = token.identity;
        match kind {
            DeferredKind::SuspendProcess => {
                match self.collaborators.launcher.suspend(identity.pid) {
                    Ok(()) => self.emit(SupervisorEvent::ProcessSuspended { identity }),
                    Err(e) => self.signal_failed(identity, "SIGSTOP", e.to_string()),
                }
            }
            DeferredKind::UnsuspendSink => {
                self.invoke_control(false);
                info!(pid = %identity.pid, "Audio resumed");
            }
        }
    }
}
