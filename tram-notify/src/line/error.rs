//! Messaging API error types.

use thiserror::Error;

/// Errors that can occur when talking to the LINE Messaging API.
#[derive(Debug, Error)]
pub enum LineError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Header value could not be built from configuration
    #[error("invalid access token")]
    InvalidToken,

    /// Delivery refused by a dry-run messenger
    #[error("delivery to {user} failed")]
    Rejected { user: String },
}
