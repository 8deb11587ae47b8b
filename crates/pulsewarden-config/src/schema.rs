//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Where the audio backend and its tools live
    pub backend: RawBackendConfig,

    /// Audio server settings
    #[serde(default)]
    pub audio: RawAudioConfig,
}

/// Backend locations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawBackendConfig {
    /// Directory holding `libpulseaudio.so` and the other native libraries
    pub native_lib_dir: PathBuf,

    /// Private working directory (default: ~/.local/share/pulsewarden/pulseaudio)
    pub working_dir: Option<PathBuf>,

    /// Temporary directory handed to spawned processes (default: $TMPDIR or /tmp)
    pub tmp_dir: Option<PathBuf>,

    /// System library directory searched first (default: /system/lib64)
    pub system_lib_dir: Option<PathBuf>,
}

/// Audio server settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAudioConfig {
    /// Unix socket the audio server listens on
    pub socket_path: Option<PathBuf>,

    /// Sink gain factor
    pub volume: Option<f32>,

    /// Sink latency/performance mode code
    pub performance_mode: Option<u8>,
}
