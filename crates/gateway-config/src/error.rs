//! Configuration errors.

use gateway_core::GatewayError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating, or persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("Failed to access config file {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be parsed.
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Parser explanation
        message: String,
    },

    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// The file extension does not map to a known format.
    #[error("Unsupported config format for {path} (expected .toml, .yaml, .yml or .json)")]
    UnsupportedFormat {
        /// File involved
        path: PathBuf,
    },

    /// An environment override held an unusable value.
    #[error("Invalid value for {var}: {message}")]
    Environment {
        /// Variable name
        var: &'static str,
        /// Explanation
        message: String,
    },

    /// The loaded configuration violates an invariant.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<ConfigError> for GatewayError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
