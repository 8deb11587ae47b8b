//! Audio backend supervisor for pulsewarden
//!
//! This crate is the heart of pulsewarden, containing:
//! - The supervisor owning the single audio server process
//!   (Stopped -> Running -> RunningPaused)
//! - The two-phase pause/resume protocol with staleness-checked deferred actions
//! - Backend config file and command line construction

mod command;
mod events;
mod state;
mod supervisor;

pub use command::*;
pub use events::*;
pub use state::*;
pub use supervisor::*;
