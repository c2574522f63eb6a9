//! Errors raised while handling driver configuration files.

use std::path::PathBuf;
use thiserror::Error;

/// Why a driver configuration could not be loaded, stored or accepted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read driver config at '{path}': {source}")]
    ReadFile {
        /// File or directory involved.
        path: PathBuf,
        /// I/O failure reported by the OS.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be stored.
    #[error("cannot store driver config at '{path}': {source}")]
    WriteFile {
        /// File or directory involved.
        path: PathBuf,
        /// I/O failure reported by the OS.
        #[source]
        source: std::io::Error,
    },

    /// The parent directory for a config file could not be created.
    #[error("cannot prepare config directory '{path}': {source}")]
    CreateDir {
        /// File or directory involved.
        path: PathBuf,
        /// I/O failure reported by the OS.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for a driver config.
    #[error("malformed driver config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The in-memory config could not be turned into TOML.
    #[error("driver config could not be encoded: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The runtime has nothing to load calibration from.
    #[error("driver config lists no calibration database")]
    NoCalibrationFiles,

    /// A numeric or path setting falls outside what the runtime accepts.
    #[error("driver config field '{field}' rejected: {reason}")]
    InvalidValue {
        /// Offending setting.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Wraps a read failure for `path`.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Wraps a write failure for `path`.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Wraps a directory creation failure for `path`.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Rejects `field` with a human-readable reason.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
