//! Error types for depot-dl
//!
//! This module provides error handling for the orchestration layer:
//! - Usage errors (bad or missing flags) with the offending flag attached
//! - I/O and network failures surfaced from the engine
//! - A crate-wide [`Result`] alias

use thiserror::Error;

/// Result type alias for depot-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for depot-dl
///
/// Usage errors carry the flag that caused them so the driver can print a
/// message that points the user at the right part of the command line.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which flag is invalid
    #[error("{message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The command-line flag that caused the error (e.g., "-manifest")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Engine-reported failure outside the exit-code channel
    #[error("engine error: {0}")]
    Engine(String),
}

impl Error {
    /// Construct a usage error tied to a specific flag
    pub fn usage(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
