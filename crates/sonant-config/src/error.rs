//! Error types for snapshot and preset operations.

use std::path::PathBuf;

use sonant_engine::EngineError;
use thiserror::Error;

/// Errors that can occur while reading, writing, validating or applying
/// snapshots.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or serialize JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// File extension names no known format
    #[error("unsupported snapshot format: '{0}' (expected .json or .toml)")]
    UnsupportedFormat(PathBuf),

    /// Preset not found
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// Preset exists and overwrite was not requested
    #[error("preset already exists: {0}")]
    PresetExists(String),

    /// Name cannot be used as a preset key
    #[error("invalid preset name: '{0}'")]
    InvalidName(String),

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// The engine refused part of a snapshot
    #[error("engine rejected snapshot: {0}")]
    Engine(#[from] EngineError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_and_display() {
        let err = ConfigError::read_file("/a/b.toml", mock_io_err());
        assert!(
            matches!(err, ConfigError::ReadFile { ref path, .. } if path == std::path::Path::new("/a/b.toml"))
        );
        let msg = err.to_string();
        assert!(msg.contains("failed to read file"), "got: {msg}");
        assert!(msg.contains("/a/b.toml"), "got: {msg}");
        assert!(err.source().is_some(), "ReadFile must expose I/O source");
    }

    #[test]
    fn write_and_create_dir_expose_source() {
        assert!(ConfigError::write_file("/x", mock_io_err()).source().is_some());
        assert!(ConfigError::create_dir("/x", mock_io_err()).source().is_some());
    }

    #[test]
    fn preset_errors_display() {
        assert_eq!(
            ConfigError::PresetNotFound("pad".to_string()).to_string(),
            "preset not found: pad"
        );
        assert_eq!(
            ConfigError::PresetExists("pad".to_string()).to_string(),
            "preset already exists: pad"
        );
        assert!(ConfigError::PresetExists("pad".to_string()).source().is_none());
    }

    #[test]
    fn wrapped_errors_convert() {
        let err: ConfigError = ValidationError::UnknownFilter(2).into();
        assert_eq!(err.to_string(), "validation failed: unknown filter index: 2");

        let err: ConfigError = EngineError::UnknownOscillator(1).into();
        assert_eq!(
            err.to_string(),
            "engine rejected snapshot: no oscillator at index 1"
        );
    }
}
