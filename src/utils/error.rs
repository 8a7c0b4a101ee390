//! Centralized error handling for GreenChoice
//!
//! Library code returns the `thiserror` types defined here; the binary and
//! the application loop wrap them in `anyhow` with context.
//!
//! None of these errors ever reach the chat transcript: the session turns
//! every request failure into the fallback reply and only logs the cause.

use thiserror::Error;

/// Errors raised while talking to the question service or loading local state
#[derive(Error, Debug)]
pub enum ChatError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Server responded with {status}: {body}")]
    Status { status: u16, body: String },

    /// A body that claimed to be JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Build a status error, truncating long bodies so logs stay readable
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.chars().count() > MAX_ERROR_BODY_CHARS {
            body = body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>() + "...";
        }
        ChatError::Status { status, body }
    }
}

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors from the session's turn bookkeeping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A turn is already outstanding
    #[error("A question is already in flight (turn {outstanding})")]
    Busy { outstanding: u64 },
}

/// Result alias for library operations
pub type ChatResult<T> = Result<T, ChatError>;
