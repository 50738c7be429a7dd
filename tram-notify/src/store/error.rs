//! Store error types.

/// Errors from the subscription, user and history stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error status
    #[error("store API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse or build a JSON payload
    #[error("JSON error: {message}")]
    Json { message: String },

    /// A row the operation depends on does not exist
    #[error("not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Api {
            status: 406,
            message: "Not Acceptable".into(),
        };
        assert_eq!(err.to_string(), "store API error 406: Not Acceptable");

        let err = StoreError::NotFound("user U123".into());
        assert_eq!(err.to_string(), "not found: user U123");
    }
}
