//! Linux process launcher

use pulsewarden_host_api::{
    ExitStatus, HostError, HostResult, LaunchSpec, ProcessId, ProcessLauncher,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::process::ManagedProcess;

/// Events from the launcher's background monitor
#[derive(Debug, Clone)]
pub enum LauncherEvent {
    /// A launched process has exited and was reaped
    Exited { pid: ProcessId, status: ExitStatus },
}

/// Launches processes in their own process groups and keeps them until reaped
pub struct LinuxLauncher {
    processes: Arc<Mutex<HashMap<u32, ManagedProcess>>>,
    event_tx: mpsc::UnboundedSender<LauncherEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<LauncherEvent>>>,
}

impl LinuxLauncher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            processes: Arc::new(Mutex::new(HashMap::new())),
            event_tx: tx,
            event_rx: Mutex::new(Some(rx)),
        }
    }

    /// Take the exit event receiver. Only the first call gets it.
    pub fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<LauncherEvent>> {
        self.event_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Number of launched processes not yet reaped
    pub fn tracked(&self) -> usize {
        self.lock_processes().len()
    }

    /// Start the background reaper
    pub fn start_monitor(&self) -> tokio::task::JoinHandle<()> {
        let processes = self.processes.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;

                let mut exited = Vec::new();

                {
                    let mut procs = processes.lock().unwrap_or_else(|e| e.into_inner());
                    for (pid, proc) in procs.iter_mut() {
                        match proc.try_wait() {
                            Ok(Some(status)) => exited.push((*pid, status)),
                            Ok(None) => {}
                            Err(e) => {
                                warn!(pid = pid, error = %e, "Error checking process status");
                            }
                        }
                    }

                    for (pid, _) in &exited {
                        procs.remove(pid);
                    }
                }

                for (pid, status) in exited {
                    debug!(pid = pid, status = ?status, "Process exited");
                    let _ = event_tx.send(LauncherEvent::Exited {
                        pid: ProcessId::new(pid),
                        status,
                    });
                }
            }
        })
    }

    fn lock_processes(&self) -> MutexGuard<'_, HashMap<u32, ManagedProcess>> {
        self.processes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_process(
        &self,
        pid: ProcessId,
        op: &str,
        f: impl FnOnce(&ManagedProcess) -> HostResult<()>,
    ) -> HostResult<()> {
        let procs = self.lock_processes();
        match procs.get(&pid.as_raw()) {
            Some(proc) => f(proc),
            None => {
                // Already reaped
                debug!(pid = %pid, op = op, "Process no longer tracked, nothing to signal");
                Ok(())
            }
        }
    }
}

impl Default for LinuxLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncher for LinuxLauncher {
    fn exec(&self, spec: &LaunchSpec) -> HostResult<ProcessId> {
        if !spec.cwd.is_dir() {
            return Err(HostError::SpawnFailed(format!(
                "Working directory {} does not exist",
                spec.cwd.display()
            )));
        }

        let proc = ManagedProcess::spawn(&spec.argv, &spec.env, &spec.cwd)?;
        let pid = proc.id();

        info!(pid = %pid, command = %spec.command_line(), "Launched process");

        self.lock_processes().insert(pid.as_raw(), proc);
        Ok(pid)
    }

    fn kill(&self, pid: ProcessId) -> HostResult<()> {
        self.with_process(pid, "kill", ManagedProcess::kill)
    }

    fn suspend(&self, pid: ProcessId) -> HostResult<()> {
        self.with_process(pid, "suspend", ManagedProcess::suspend)
    }

    fn resume(&self, pid: ProcessId) -> HostResult<()> {
        self.with_process(pid, "resume", ManagedProcess::resume)
    }

    fn is_running(&self, pid: ProcessId) -> bool {
        // Entries are removed before their exit event is sent
        self.lock_processes().contains_key(&pid.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> LaunchSpec {
        LaunchSpec::new(
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            "/",
        )
        .with_env("PATH", "/usr/bin:/bin")
    }

    #[test]
    fn exec_rejects_missing_working_dir() {
        let launcher = LinuxLauncher::new();
        let mut spec = sh("true");
        spec.cwd = "/definitely/not/here".into();

        assert!(matches!(launcher.exec(&spec), Err(HostError::SpawnFailed(_))));
        assert_eq!(launcher.tracked(), 0);
    }

    #[test]
    fn signals_to_unknown_pid_are_noops() {
        let launcher = LinuxLauncher::new();
        let pid = ProcessId::new(u32::MAX - 1);

        assert!(launcher.kill(pid).is_ok());
        assert!(launcher.suspend(pid).is_ok());
        assert!(launcher.resume(pid).is_ok());
    }

    #[test]
    fn subscribe_only_once() {
        let launcher = LinuxLauncher::new();
        assert!(launcher.subscribe().is_some());
        assert!(launcher.subscribe().is_none());
    }

    #[tokio::test]
    async fn monitor_reports_exit() {
        let launcher = LinuxLauncher::new();
        let mut events = launcher.subscribe().unwrap();
        let _monitor = launcher.start_monitor();

        let pid = launcher.exec(&sh("exit 3")).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();

        match event {
            LauncherEvent::Exited { pid: exited, status } => {
                assert_eq!(exited, pid);
                assert_eq!(status.code, Some(3));
            }
        }
        assert_eq!(launcher.tracked(), 0);
    }

    #[tokio::test]
    async fn monitor_reports_killed_process() {
        let launcher = LinuxLauncher::new();
        let mut events = launcher.subscribe().unwrap();
        let _monitor = launcher.start_monitor();

        let pid = launcher.exec(&sh("sleep 60")).unwrap();
        launcher.suspend(pid).unwrap();
        launcher.resume(pid).unwrap();
        launcher.kill(pid).unwrap();

        let LauncherEvent::Exited { pid: exited, status } =
            tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .unwrap()
                .unwrap();

        assert_eq!(exited, pid);
        assert!(status.signaled);
        assert!(!launcher.is_running(pid));
    }

    #[tokio::test]
    async fn running_until_reaped() {
        let launcher = LinuxLauncher::new();
        let mut events = launcher.subscribe().unwrap();

        let pid = launcher.exec(&sh("exit 0")).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Exited but not reaped yet
        assert!(launcher.is_running(pid));

        let _monitor = launcher.start_monitor();
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!launcher.is_running(pid));
    }
}
