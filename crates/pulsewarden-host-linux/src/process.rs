//! Process management utilities

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tracing::debug;

use pulsewarden_host_api::{ExitStatus, HostError, HostResult, ProcessId};

/// Managed child process with process group
pub struct ManagedProcess {
    pub child: Child,
    pub pid: u32,
    pub pgid: u32,
}

impl ManagedProcess {
    /// Spawn a new process in its own process group
    ///
    /// The child sees exactly `env`; nothing is inherited from this process.
    pub fn spawn(argv: &[String], env: &HashMap<String, String>, cwd: &Path) -> HostResult<Self> {
        if argv.is_empty() {
            return Err(HostError::SpawnFailed("Empty argv".into()));
        }

        let program = &argv[0];
        let args = &argv[1..];

        let mut cmd = Command::new(program);
        cmd.args(args);

        cmd.env_clear();
        for (k, v) in env {
            cmd.env(k, v);
        }

        cmd.current_dir(cwd);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        // Set up process group - this child becomes its own process group leader
        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid().map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
                })?;
                Ok(())
            });
        }

        let child = cmd.spawn().map_err(|e| {
            HostError::SpawnFailed(format!("Failed to spawn {}: {}", program, e))
        })?;

        let pid = child.id();
        let pgid = pid; // After setsid, pid == pgid

        debug!(pid = pid, pgid = pgid, program = %program, "Process spawned");

        Ok(Self { child, pid, pgid })
    }

    pub fn id(&self) -> ProcessId {
        ProcessId::new(self.pid)
    }

    /// Send SIGKILL to the process group
    pub fn kill(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGKILL)
    }

    /// Send SIGSTOP to the process group
    pub fn suspend(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGSTOP)
    }

    /// Send SIGCONT to the process group
    pub fn resume(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGCONT)
    }

    fn signal_group(&self, sig: Signal) -> HostResult<()> {
        let pgid = Pid::from_raw(-(self.pgid as i32)); // Negative for process group

        match signal::kill(pgid, sig) {
            Ok(()) => {
                debug!(pgid = self.pgid, signal = %sig, "Sent signal to process group");
                Ok(())
            }
            Err(nix::errno::Errno::ESRCH) => {
                // Process already gone
                Ok(())
            }
            Err(e) => Err(HostError::SignalFailed {
                pid: self.id(),
                signal: sig.as_str(),
                message: e.to_string(),
            }),
        }
    }

    /// Check if the process has exited (non-blocking)
    pub fn try_wait(&mut self) -> HostResult<Option<ExitStatus>> {
        match self.child.try_wait() {
            Ok(Some(status)) => Ok(Some(convert_status(status))),
            Ok(None) => Ok(None),
            Err(e) => Err(HostError::Internal(format!("Wait failed: {}", e))),
        }
    }

    /// Wait for the process to exit (blocking)
    pub fn wait(&mut self) -> HostResult<ExitStatus> {
        self.child
            .wait()
            .map(convert_status)
            .map_err(|e| HostError::Internal(format!("Wait failed: {}", e)))
    }
}

fn convert_status(status: std::process::ExitStatus) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    if let Some(code) = status.code() {
        ExitStatus::with_code(code)
    } else if let Some(sig) = status.signal() {
        ExitStatus::signaled(sig)
    } else {
        ExitStatus::with_code(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn path_env() -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        env
    }

    #[test]
    fn spawn_simple_process() {
        let mut proc =
            ManagedProcess::spawn(&argv(&["true"]), &path_env(), Path::new("/")).unwrap();

        let status = proc.wait().unwrap();
        assert!(status.is_success());
    }

    #[test]
    fn spawn_rejects_empty_argv() {
        let result = ManagedProcess::spawn(&[], &HashMap::new(), Path::new("/"));
        assert!(matches!(result, Err(HostError::SpawnFailed(_))));
    }

    #[test]
    fn spawn_sees_only_given_env() {
        let mut env = path_env();
        env.insert("PULSE_TEST_VALUE".into(), "42".into());

        let mut proc = ManagedProcess::spawn(
            &argv(&["sh", "-c", "test \"$PULSE_TEST_VALUE\" = 42 && test -z \"$USER\""]),
            &env,
            Path::new("/"),
        )
        .unwrap();

        assert!(proc.wait().unwrap().is_success());
    }

    #[test]
    fn spawn_uses_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut proc = ManagedProcess::spawn(
            &argv(&["sh", "-c", "touch marker"]),
            &path_env(),
            dir.path(),
        )
        .unwrap();

        assert!(proc.wait().unwrap().is_success());
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn suspend_resume_then_kill() {
        let mut proc =
            ManagedProcess::spawn(&argv(&["sleep", "60"]), &path_env(), Path::new("/")).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(50));

        proc.suspend().unwrap();
        proc.resume().unwrap();
        proc.kill().unwrap();

        let status = proc.wait().unwrap();
        assert_eq!(status.signal, Some(Signal::SIGKILL as i32));
    }

    #[test]
    fn signals_to_exited_process_succeed() {
        let mut proc =
            ManagedProcess::spawn(&argv(&["true"]), &path_env(), Path::new("/")).unwrap();
        proc.wait().unwrap();

        assert!(proc.kill().is_ok());
        assert!(proc.suspend().is_ok());
    }
}
