//! Shared utilities for pulsewarden
//!
//! This crate provides default paths for the configuration file, the
//! audio server socket and the backend working directory.

mod paths;

pub use paths::*;
