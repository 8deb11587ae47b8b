//! In-memory collaborators for testing

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    ConfigWriter, DeferredAction, DeferredScheduler, HostError, HostResult, LaunchSpec,
    ProcessId, ProcessLauncher,
};

/// A call recorded by [`MockLauncher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherCall {
    Exec(LaunchSpec),
    Kill(ProcessId),
    Suspend(ProcessId),
    Resume(ProcessId),
}

/// Mock process launcher for unit/integration testing
///
/// Hands out increasing fake pids and records every call in order.
pub struct MockLauncher {
    next_pid: AtomicU32,
    calls: Arc<Mutex<Vec<LauncherCall>>>,
    running: Arc<Mutex<HashSet<ProcessId>>>,
    launched: Arc<Mutex<Vec<(ProcessId, LaunchSpec)>>>,

    /// Configure every exec to fail
    pub fail_exec: Arc<Mutex<bool>>,

    /// Programs (matched by path suffix) whose exec fails
    pub failing_programs: Arc<Mutex<Vec<String>>>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1000),
            calls: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(Mutex::new(HashSet::new())),
            launched: Arc::new(Mutex::new(Vec::new())),
            fail_exec: Arc::new(Mutex::new(false)),
            failing_programs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make exec fail for programs whose path ends with `suffix`
    pub fn fail_program(&self, suffix: impl Into<String>) {
        self.failing_programs.lock().unwrap().push(suffix.into());
    }

    /// All recorded calls, oldest first
    pub fn calls(&self) -> Vec<LauncherCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Launch specs passed to exec, oldest first
    pub fn execs(&self) -> Vec<LaunchSpec> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                LauncherCall::Exec(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn kills(&self) -> Vec<ProcessId> {
        self.filter_pids(|c| match c {
            LauncherCall::Kill(pid) => Some(*pid),
            _ => None,
        })
    }

    pub fn suspends(&self) -> Vec<ProcessId> {
        self.filter_pids(|c| match c {
            LauncherCall::Suspend(pid) => Some(*pid),
            _ => None,
        })
    }

    pub fn resumes(&self) -> Vec<ProcessId> {
        self.filter_pids(|c| match c {
            LauncherCall::Resume(pid) => Some(*pid),
            _ => None,
        })
    }

    /// Processes started and not yet killed
    pub fn running(&self) -> Vec<ProcessId> {
        self.running.lock().unwrap().iter().copied().collect()
    }

    /// Simulate `pid` exiting on its own
    pub fn exit(&self, pid: ProcessId) {
        self.running.lock().unwrap().remove(&pid);
    }

    /// Every successfully started process with its launch spec, oldest first
    pub fn launched(&self) -> Vec<(ProcessId, LaunchSpec)> {
        self.launched.lock().unwrap().clone()
    }

    fn filter_pids(&self, f: impl Fn(&LauncherCall) -> Option<ProcessId>) -> Vec<ProcessId> {
        self.calls.lock().unwrap().iter().filter_map(f).collect()
    }

    fn should_fail(&self, spec: &LaunchSpec) -> bool {
        if *self.fail_exec.lock().unwrap() {
            return true;
        }
        let program = spec.program().unwrap_or_default();
        self.failing_programs
            .lock()
            .unwrap()
            .iter()
            .any(|suffix| program.ends_with(suffix.as_str()))
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncher for MockLauncher {
    fn exec(&self, spec: &LaunchSpec) -> HostResult<ProcessId> {
        self.calls.lock().unwrap().push(LauncherCall::Exec(spec.clone()));

        if self.should_fail(spec) {
            return Err(HostError::SpawnFailed(format!(
                "Mock spawn failure: {}",
                spec.program().unwrap_or("<empty>")
            )));
        }

        let pid = ProcessId::new(self.next_pid.fetch_add(1, Ordering::SeqCst));
        self.running.lock().unwrap().insert(pid);
        self.launched.lock().unwrap().push((pid, spec.clone()));
        Ok(pid)
    }

    fn kill(&self, pid: ProcessId) -> HostResult<()> {
        self.calls.lock().unwrap().push(LauncherCall::Kill(pid));
        self.running.lock().unwrap().remove(&pid);
        Ok(())
    }

    fn suspend(&self, pid: ProcessId) -> HostResult<()> {
        self.calls.lock().unwrap().push(LauncherCall::Suspend(pid));
        Ok(())
    }

    fn resume(&self, pid: ProcessId) -> HostResult<()> {
        self.calls.lock().unwrap().push(LauncherCall::Resume(pid));
        Ok(())
    }

    fn is_running(&self, pid: ProcessId) -> bool {
        self.running.lock().unwrap().contains(&pid)
    }
}

/// A call recorded by [`MemoryConfigWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterCall {
    EnsureDir { path: PathBuf, mode: u32 },
    WriteText { path: PathBuf },
}

/// Config writer that keeps directories and files in memory
#[derive(Default)]
pub struct MemoryConfigWriter {
    dirs: Mutex<HashMap<PathBuf, u32>>,
    files: Mutex<HashMap<PathBuf, String>>,
    calls: Mutex<Vec<WriterCall>>,
    fail_dirs: Mutex<bool>,
}

impl MemoryConfigWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content last written to `path`
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// Mode a directory was created with
    pub fn dir_mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.dirs.lock().unwrap().get(path.as_ref()).copied()
    }

    pub fn calls(&self) -> Vec<WriterCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make every later `ensure_dir` fail
    pub fn fail_dirs(&self) {
        *self.fail_dirs.lock().unwrap() = true;
    }
}

impl ConfigWriter for MemoryConfigWriter {
    fn ensure_dir(&self, path: &Path, mode: u32) -> HostResult<()> {
        self.calls.lock().unwrap().push(WriterCall::EnsureDir {
            path: path.to_path_buf(),
            mode,
        });
        if *self.fail_dirs.lock().unwrap() {
            return Err(HostError::Internal(format!(
                "Mock ensure_dir failure: {}",
                path.display()
            )));
        }
        self.dirs
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_insert(mode);
        Ok(())
    }

    fn write_text(&self, path: &Path, content: &str) -> HostResult<()> {
        self.calls.lock().unwrap().push(WriterCall::WriteText {
            path: path.to_path_buf(),
        });
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

/// Scheduler whose actions only run when the test says so
///
/// Actions run in the order they were scheduled, which matches a single
/// timeline with a fixed delay.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<(Duration, DeferredAction)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions waiting to run
    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Delays of the waiting actions, oldest first
    pub fn delays(&self) -> Vec<Duration> {
        self.pending.lock().unwrap().iter().map(|(d, _)| *d).collect()
    }

    /// Run the oldest waiting action. Returns false if none was waiting.
    pub fn run_next(&self) -> bool {
        let next = {
            let mut pending = self.pending.lock().unwrap();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };

        match next {
            Some((_, action)) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Run every action waiting right now. Actions scheduled while these run
    /// stay pending.
    pub fn run_pending(&self) -> usize {
        let actions = std::mem::take(&mut *self.pending.lock().unwrap());
        let count = actions.len();
        for (_, action) in actions {
            action();
        }
        count
    }
}

impl DeferredScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, action: DeferredAction) {
        self.pending.lock().unwrap().push((delay, action));
    }
}
