//! Host collaborator trait interfaces for pulsewarden
//!
//! This crate defines the interface between the supervisor core and the
//! platform it runs on: launching and signalling processes, writing the
//! backend's configuration files, and running deferred callbacks. It
//! contains no platform code itself.

mod handle;
mod mock;
mod traits;

pub use handle::*;
pub use mock::*;
pub use traits::*;
