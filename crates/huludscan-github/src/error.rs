//! Retrieval error types.

use thiserror::Error;

/// Errors that can occur while talking to the GitHub audit-log API.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Transport-level failure (connection, TLS, timeout, body read).
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("audit-log API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// A response page could not be decoded as audit-log events.
    #[error("malformed audit-log response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL is not a valid URL.
    #[error("invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, GithubError>;
