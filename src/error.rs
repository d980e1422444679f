//! Pipeline error types

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors surfaced by the request pipeline
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network request failed
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP error status (the transport treats non-2xx as failure)
    #[error("HTTP {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header name or value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to build the transport binding
    #[error("Failed to build HTTP transport: {0}")]
    BuildClient(String),

    /// A successful transport response that the response transform hook
    /// classified as an application-level failure
    #[error("Request error: {0}")]
    Rejected(String),

    /// A caller-supplied hook failed; propagated unmodified
    #[error("Hook failed: {0}")]
    Hook(String),

    /// The request was superseded by a newer in-flight duplicate
    #[error("Request cancelled by duplicate: {fingerprint}")]
    Cancelled { fingerprint: String },

    /// Response body could not be decoded
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl HttpError {
    /// Check whether this request was cancelled by a newer duplicate.
    ///
    /// Lets callers distinguish "superseded" from a genuine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HttpError::Cancelled { .. })
    }
}
