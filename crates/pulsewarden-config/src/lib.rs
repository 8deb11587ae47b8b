//! Configuration parsing and validation for pulsewarden
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Backend locations (native libraries, working and temp directories)
//! - Audio server socket and initial sink settings
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<DaemonConfig> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading configuration");
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<DaemonConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(DaemonConfig::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn parse_minimal_config() {
        let config = r#"
            config_version = 1

            [backend]
            native_lib_dir = "/data/app/lib/arm64"
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.backend.native_lib_dir, PathBuf::from("/data/app/lib/arm64"));
        assert_eq!(config.backend.system_lib_dir, PathBuf::from(DEFAULT_SYSTEM_LIB_DIR));
        assert_eq!(config.audio, AudioSettings::default());
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [backend]
            native_lib_dir = "/data/app/lib/arm64"
            working_dir = "/data/files/pulseaudio"
            tmp_dir = "/data/files/tmp"
            system_lib_dir = "/system/lib"

            [audio]
            socket_path = "/tmp/pulse.sock"
            volume = 0.5
            performance_mode = 2
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.backend.working_dir, PathBuf::from("/data/files/pulseaudio"));
        assert_eq!(config.backend.tmp_dir, PathBuf::from("/data/files/tmp"));
        assert_eq!(config.backend.system_lib_dir, PathBuf::from("/system/lib"));
        assert_eq!(config.socket_path, PathBuf::from("/tmp/pulse.sock"));
        assert_eq!(config.audio.volume, 0.5);
        assert_eq!(config.audio.performance_mode, 2);
    }

    #[test]
    fn reject_wrong_version() {
        let config = r#"
            config_version = 99

            [backend]
            native_lib_dir = "/lib"
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_relative_paths() {
        let config = r#"
            config_version = 1

            [backend]
            native_lib_dir = "lib"
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn reject_out_of_range_performance_mode() {
        let config = r#"
            config_version = 1

            [backend]
            native_lib_dir = "/lib"

            [audio]
            performance_mode = 300
        "#;

        assert!(matches!(parse_config(config), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1").unwrap();
        writeln!(file, "[backend]").unwrap();
        writeln!(file, "native_lib_dir = \"/lib\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backend.native_lib_dir, PathBuf::from("/lib"));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
