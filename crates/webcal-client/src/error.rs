//! Client error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use webcal_core::CoreError;
use webcal_providers::ProviderError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configuration file could not be read, parsed or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// A configuration file given explicitly does not exist.
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Fetching or parsing the calendar failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Evaluating a query failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A command-line value could not be understood.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Rendering JSON output failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
