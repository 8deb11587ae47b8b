//! Default paths for pulsewarden components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/pulsewarden/config.toml` or `~/.config/pulsewarden/config.toml`
//! - Socket: `$XDG_RUNTIME_DIR/pulsewarden/pulse.sock` or `/tmp/pulsewarden-$USER/pulse.sock`
//! - Working dir: `$XDG_DATA_HOME/pulsewarden/pulseaudio` or `~/.local/share/pulsewarden/pulseaudio`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const PULSEWARDEN_CONFIG_ENV: &str = "PULSEWARDEN_CONFIG";

/// Environment variable for overriding the audio server socket path
pub const PULSEWARDEN_SOCKET_ENV: &str = "PULSEWARDEN_SOCKET";

/// Socket filename within the socket directory
const SOCKET_FILENAME: &str = "pulse.sock";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Backend working directory name
const BACKEND_DIR: &str = "pulseaudio";

/// Application subdirectory name
const APP_DIR: &str = "pulsewarden";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$PULSEWARDEN_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/pulsewarden/config.toml`
/// 3. `~/.config/pulsewarden/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(PULSEWARDEN_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default audio server socket path.
///
/// Order of precedence:
/// 1. `$PULSEWARDEN_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/pulsewarden/pulse.sock`
/// 3. `/tmp/pulsewarden-$USER/pulse.sock`
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(PULSEWARDEN_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking PULSEWARDEN_SOCKET env var.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default backend working directory.
///
/// This is where the generated `default.pa`, the `pactl` tool and the
/// backend's `modules/` directory live. It doubles as the backend's `HOME`.
pub fn default_working_dir() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR).join(BACKEND_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR)
            .join(BACKEND_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join(BACKEND_DIR)
}

/// Get the default temporary directory handed to spawned processes
pub fn default_tmp_dir() -> PathBuf {
    std::env::var("TMPDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_contains_pulsewarden() {
        let path = socket_path_without_env();
        assert!(path.to_string_lossy().contains("pulsewarden"));
        assert!(path.to_string_lossy().ends_with("pulse.sock"));
    }

    #[test]
    fn working_dir_ends_with_backend_dir() {
        let path = default_working_dir();
        assert!(path.ends_with("pulsewarden/pulseaudio"));
    }

    #[test]
    fn config_path_is_toml() {
        let path = default_config_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }

    #[test]
    fn tmp_dir_is_absolute() {
        assert!(default_tmp_dir().is_absolute() || std::env::var("TMPDIR").is_ok());
    }
}
