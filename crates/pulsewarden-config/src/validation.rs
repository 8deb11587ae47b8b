//! Configuration validation

use crate::schema::RawConfig;
use std::path::Path;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: path must not be empty")]
    EmptyPath { field: &'static str },

    #[error("{field}: path '{path}' must be absolute")]
    RelativePath { field: &'static str, path: String },
}

/// Validate a raw configuration
///
/// Volume and performance mode are passed to the backend unchecked.
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_path(
        "backend.native_lib_dir",
        Some(&config.backend.native_lib_dir),
        &mut errors,
    );
    check_path(
        "backend.working_dir",
        config.backend.working_dir.as_deref(),
        &mut errors,
    );
    check_path("backend.tmp_dir", config.backend.tmp_dir.as_deref(), &mut errors);
    check_path(
        "backend.system_lib_dir",
        config.backend.system_lib_dir.as_deref(),
        &mut errors,
    );
    check_path("audio.socket_path", config.audio.socket_path.as_deref(), &mut errors);

    errors
}

fn check_path(field: &'static str, path: Option<&Path>, errors: &mut Vec<ValidationError>) {
    let Some(path) = path else {
        return;
    };

    if path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyPath { field });
    } else if !path.is_absolute() {
        errors.push(ValidationError::RelativePath {
            field,
            path: path.display().to_string(),
        });
    }
}
