//! Core error types for routinely-core.
//!
//! Three families, matching how problems are surfaced:
//! - [`FormatError`]: user-supplied routine edit text is invalid. Recovered
//!   locally, shown to the user, never mutates existing state.
//! - [`StorageError`]: database or serialization failure. Load paths never
//!   return this for corrupt payloads -- they fall back to defaults.
//! - [`ConfigError`]: configuration file or key problems.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for routinely-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Routine edit text is invalid.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A routine edit line that does not conform to the `Name;Hours` format.
///
/// Line numbers are 1-based and refer to the submitted text, blank lines
/// included.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A line does not split into exactly a name and an hours field.
    #[error("line {line_no}: expected 'Name;Hours', got '{line}'")]
    FieldCount { line_no: usize, line: String },

    /// The name field is empty after trimming.
    #[error("line {line_no}: task name is empty")]
    EmptyName { line_no: usize },

    /// The hours field is not a positive decimal number (`.` or `,`
    /// accepted as the separator).
    #[error("line {line_no}: '{value}' is not a positive number of hours")]
    BadHours { line_no: usize, value: String },

    /// The submitted text contains no tasks at all.
    #[error("routine must contain at least one task")]
    EmptyRoutine,

    /// A task outside the text path (e.g. deserialized) breaks the routine
    /// invariants.
    #[error("invalid task '{name}': name must be non-empty and duration positive")]
    InvalidTask { name: String },
}

/// Database and serialization errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_names_the_line() {
        let err = FormatError::BadHours {
            line_no: 2,
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "line 2: 'abc' is not a positive number of hours");
    }

    #[test]
    fn format_error_converts_into_core_error() {
        let err: CoreError = FormatError::EmptyRoutine.into();
        assert!(matches!(err, CoreError::Format(FormatError::EmptyRoutine)));
    }
}
