//! Error types for scaffolder operations.
//!
//! This module defines [`ScaffolderError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Failures that affect a single module file or a single component are
//!   isolated: they are reported to the diagnostics sink and skipped
//! - Failures that compromise a whole scan or the registry's persisted
//!   state are returned to the caller
//! - Use `anyhow::Error` (via `ScaffolderError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for scaffolder operations.
#[derive(Debug, Error)]
pub enum ScaffolderError {
    /// A scan source was empty or could not be mounted.
    #[error("Invalid scan source '{location}': {message}")]
    InvalidSource { location: String, message: String },

    /// A component was registered under a capability it does not implement.
    #[error("Component '{component}' does not implement capability '{capability}'")]
    TypeMismatch {
        component: String,
        capability: String,
    },

    /// The persisted component index is corrupt.
    #[error("Failed to parse settings file at {path}: {message}")]
    SettingsParse { path: PathBuf, message: String },

    /// Reading the persisted component index kept failing.
    #[error("Failed to read settings file at {path} after {attempts} attempts: {source}")]
    SettingsRead {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// A single module file could not be loaded.
    #[error("Failed to load module {path}: {message}")]
    ModuleLoad { path: PathBuf, message: String },

    /// No probing location holds a loadable module for the identity.
    #[error("No module satisfies '{identity}'")]
    ResolutionNotFound { identity: String },

    /// A module identity or type reference string is malformed.
    #[error("Invalid module identity '{value}': {message}")]
    InvalidIdentity { value: String, message: String },

    /// A known component could not be constructed.
    #[error("Failed to activate '{type_reference}': {message}")]
    Activation {
        type_reference: String,
        message: String,
    },

    /// Failed to parse the engine configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for scaffolder operations.
pub type Result<T> = std::result::Result<T, ScaffolderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_source_displays_location() {
        let err = ScaffolderError::InvalidSource {
            location: "/nowhere".into(),
            message: "not mountable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nowhere"));
        assert!(msg.contains("not mountable"));
    }

    #[test]
    fn type_mismatch_displays_component_and_capability() {
        let err = ScaffolderError::TypeMismatch {
            component: "FolderInstallerFactory".into(),
            capability: "scaffolder.generator".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("FolderInstallerFactory"));
        assert!(msg.contains("scaffolder.generator"));
    }

    #[test]
    fn settings_read_preserves_io_source() {
        let err = ScaffolderError::SettingsRead {
            path: PathBuf::from("/settings/components.json"),
            attempts: 20,
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"),
        };
        assert!(err.to_string().contains("20 attempts"));
        let source = err.source().unwrap();
        assert!(source.to_string().contains("locked"));
    }

    #[test]
    fn settings_parse_is_distinct_from_read() {
        let err = ScaffolderError::SettingsParse {
            path: PathBuf::from("/settings/components.json"),
            message: "expected value".into(),
        };
        assert!(matches!(err, ScaffolderError::SettingsParse { .. }));
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ScaffolderError = io_err.into();
        assert!(matches!(err, ScaffolderError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(ScaffolderError::ResolutionNotFound {
                identity: "Foo, Version=1.0.0.0".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
