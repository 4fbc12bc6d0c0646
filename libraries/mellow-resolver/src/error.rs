//! Error types for the resolution client

use thiserror::Error;

/// Errors that can occur while resolving a song
#[derive(Error, Debug)]
pub enum ResolverError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint is offline or unreachable (connect/transport failure)
    #[error("Resolution endpoint unreachable: {0}")]
    Unreachable(String),

    /// No response within the allowed window
    #[error("Resolution timed out")]
    Timeout,

    /// Upstream answered with a non-success code
    #[error("Upstream error ({code}): {message}")]
    Api {
        /// Upstream `code` field
        code: i64,
        /// Upstream message, if any
        message: String,
    },

    /// Response succeeded but carried no syntactically valid audio URL
    #[error("Invalid audio URL: {0}")]
    InvalidAudioUrl(String),

    /// Response body did not match any known payload shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid proxy base URL or stored request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, ResolverError>;
