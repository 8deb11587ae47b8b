//! Linux host collaborators for pulsewarden
//!
//! Provides:
//! - Process spawning with process group isolation
//! - Forceful termination (SIGKILL), suspension (SIGSTOP) and resumption (SIGCONT)
//! - Exit observation
//! - Config directory/file materialization with permission bits
//! - Deferred callbacks on the tokio runtime

mod fs;
mod launcher;
mod process;
mod scheduler;

pub use fs::*;
pub use launcher::*;
pub use process::*;
pub use scheduler::*;
