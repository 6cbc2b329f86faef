//! Error types for handlers and the dispatch boundary

use http::StatusCode;
use thiserror::Error;

/// Structured HTTP error carrying a status code and message.
///
/// Handlers can return this to signal a failure with a specific status.
/// The message defaults to the canonical reason phrase for the code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("code={code}, message={message}")]
pub struct HttpError {
    /// HTTP status code for this error
    pub code: StatusCode,
    /// Human-readable message
    pub message: String,
}

impl HttpError {
    /// Create an error with an explicit message
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an error whose message is the canonical reason phrase
    /// (e.g. `404` → `"Not Found"`)
    pub fn from_status(code: StatusCode) -> Self {
        let message = code.canonical_reason().unwrap_or("Unknown Status");
        Self {
            code,
            message: message.to_string(),
        }
    }
}

/// Errors returned by handlers and middleware during chain execution.
///
/// A `HandlerError` is fatal for the request that produced it: the dispatcher
/// logs it, guarantees the response is terminated (a bare 500 if nothing was
/// committed yet), and never retries.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Structured HTTP failure with a status code
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Opaque application failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Shorthand for a structured HTTP failure
    pub fn http(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Http(HttpError::new(code, message))
    }
}

/// Result type returned by handlers and middleware
pub type HandlerResult = Result<(), HandlerError>;
