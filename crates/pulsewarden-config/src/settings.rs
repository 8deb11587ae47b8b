//! Validated configuration

use crate::schema::RawConfig;
use pulsewarden_util::{default_socket_path, default_tmp_dir, default_working_dir};
use std::path::PathBuf;

/// Default system library directory on the host OS
pub const DEFAULT_SYSTEM_LIB_DIR: &str = "/system/lib64";

/// Validated daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub backend: BackendPaths,

    /// Unix socket the audio server listens on
    pub socket_path: PathBuf,

    /// Settings applied at the first start
    pub audio: AudioSettings,
}

impl DaemonConfig {
    pub(crate) fn from_raw(raw: RawConfig) -> Self {
        let defaults = AudioSettings::default();

        Self {
            backend: BackendPaths {
                native_lib_dir: raw.backend.native_lib_dir,
                working_dir: raw.backend.working_dir.unwrap_or_else(default_working_dir),
                tmp_dir: raw.backend.tmp_dir.unwrap_or_else(default_tmp_dir),
                system_lib_dir: raw
                    .backend
                    .system_lib_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SYSTEM_LIB_DIR)),
            },
            socket_path: raw.audio.socket_path.unwrap_or_else(default_socket_path),
            audio: AudioSettings {
                volume: raw.audio.volume.unwrap_or(defaults.volume),
                performance_mode: raw
                    .audio
                    .performance_mode
                    .unwrap_or(defaults.performance_mode),
            },
        }
    }
}

/// Filesystem locations the backend is launched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPaths {
    /// Holds `libpulseaudio.so`
    pub native_lib_dir: PathBuf,

    /// Backend `HOME`; holds `default.pa`, `pactl` and `modules/`
    pub working_dir: PathBuf,

    pub tmp_dir: PathBuf,

    pub system_lib_dir: PathBuf,
}

/// Tunables written into the backend config at start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSettings {
    /// Gain factor, passed through unchecked
    pub volume: f32,

    /// Backend latency/performance tradeoff code
    pub performance_mode: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            performance_mode: 1,
        }
    }
}
