//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading, validating or storing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A configuration file could not be written.
    #[error("failed to write config file {path}: {source}")]
    WriteError {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML or has the wrong shape.
    #[error("failed to parse config {path}: {source}")]
    ParseError {
        /// Path of the file, or a placeholder for embedded/merged trees.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// Configuration could not be serialized back to TOML.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A field holds an invalid value.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// No external editor command has been configured.
    #[error("no editor command configured; run `tbed config set` first")]
    MissingEditor,

    /// No home or configuration directory could be determined.
    #[error("could not determine the configuration directory")]
    NoHomeDir,

    /// Internal store failure (poisoned lock and similar).
    #[error("internal config error: {0}")]
    Internal(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
