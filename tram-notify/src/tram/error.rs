//! Position source error types.

/// Errors from fetching tram positions.
///
/// Any of these fails the whole fetch; a partial list is never returned.
#[derive(Debug, thiserror::Error)]
pub enum TramError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status
    #[error("tram API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Body was not valid JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Body was valid JSON but not an array
    #[error("expected a JSON array of positions, got {found}")]
    NotAList { found: &'static str },

    /// Local snapshot could not be loaded
    #[error("snapshot {path}: {message}")]
    Snapshot { path: String, message: String },

    /// Transport failure seen by another caller of a shared fetch
    #[error("HTTP error: {message}")]
    Transport { message: String },
}

impl TramError {
    /// Rebuild an error another owner still holds, keeping its variant.
    ///
    /// `reqwest::Error` cannot be cloned, so `Http` becomes `Transport`.
    pub fn duplicate(&self) -> Self {
        match self {
            TramError::Http(e) => TramError::Transport {
                message: e.to_string(),
            },
            TramError::Api { status, message } => TramError::Api {
                status: *status,
                message: message.clone(),
            },
            TramError::Json { message, body } => TramError::Json {
                message: message.clone(),
                body: body.clone(),
            },
            TramError::NotAList { found } => TramError::NotAList { found },
            TramError::Snapshot { path, message } => TramError::Snapshot {
                path: path.clone(),
                message: message.clone(),
            },
            TramError::Transport { message } => TramError::Transport {
                message: message.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TramError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "tram API error 503: Service Unavailable");

        let err = TramError::NotAList { found: "object" };
        assert_eq!(
            err.to_string(),
            "expected a JSON array of positions, got object"
        );
    }

    #[test]
    fn duplicate_keeps_variant() {
        let err = TramError::Api {
            status: 503,
            message: "busy".into(),
        };
        assert!(matches!(
            err.duplicate(),
            TramError::Api { status: 503, ref message } if message == "busy"
        ));

        let err = TramError::NotAList { found: "string" };
        assert!(matches!(
            err.duplicate(),
            TramError::NotAList { found: "string" }
        ));

        let err = TramError::Json {
            message: "eof".into(),
            body: Some("[".into()),
        };
        assert_eq!(err.duplicate().to_string(), err.to_string());
    }
}
