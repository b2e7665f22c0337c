//! Error types for asset generation.
//!
//! Every generation failure is recoverable: the caller substitutes a
//! fallback asset and carries on.

use thiserror::Error;

/// Result type for generation.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Longest response body kept in a status error.
const MAX_ERROR_BODY: usize = 500;

/// Errors from external generators.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned data that is not an image")]
    InvalidImage { service: &'static str },

    #[error("{service} produced empty output")]
    EmptyOutput { service: &'static str },

    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("{service} job failed: {message}")]
    JobFailed {
        service: &'static str,
        message: String,
    },

    #[error("{program} failed: {message}")]
    Process { program: String, message: String },

    #[error("{service} did not finish within {seconds} seconds")]
    Timeout { service: &'static str, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// Non-success HTTP status, keeping the start of the body.
    pub fn status(service: &'static str, status: u16, body: impl Into<String>) -> Self {
        let body: String = body.into();
        let body = if body.chars().count() > MAX_ERROR_BODY {
            body.chars().take(MAX_ERROR_BODY).collect()
        } else {
            body
        };
        Self::Status {
            service,
            status,
            body,
        }
    }

    /// External program failure.
    pub fn process(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Process {
            program: program.into(),
            message: message.into(),
        }
    }
}
