//! Fetch error types.

use thiserror::Error;

/// Failures from the nearby query.
///
/// Cloneable so one failure can be delivered to every caller attached to
/// the same in-flight request. Nothing is retried automatically; use
/// [`FetchError::is_retryable`] to decide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection failure, timeout or dropped request.
    #[error("network error: {0}")]
    Network(String),

    /// The query was rejected before or by the server.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The server refused the credentials (401/403).
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// The requested artifact does not exist or is not visible.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Map a non-success HTTP status and its detail text to an error.
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            401 | 403 => Self::AuthRequired(detail),
            400 | 422 => Self::InvalidQuery(detail),
            404 => Self::NotFound(detail),
            _ => Self::Server { status, detail },
        }
    }

    /// Transient failures that may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            FetchError::from_status(401, "Not authenticated".into()),
            FetchError::AuthRequired("Not authenticated".into())
        );
        assert!(matches!(
            FetchError::from_status(403, String::new()),
            FetchError::AuthRequired(_)
        ));
        assert!(matches!(
            FetchError::from_status(422, String::new()),
            FetchError::InvalidQuery(_)
        ));
        assert!(matches!(
            FetchError::from_status(404, String::new()),
            FetchError::NotFound(_)
        ));
        assert_eq!(
            FetchError::from_status(503, "busy".into()),
            FetchError::Server {
                status: 503,
                detail: "busy".into()
            }
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Network("reset".into()).is_retryable());
        assert!(FetchError::from_status(502, String::new()).is_retryable());
        assert!(!FetchError::from_status(418, String::new()).is_retryable());
        assert!(!FetchError::InvalidQuery("radius".into()).is_retryable());
        assert!(!FetchError::AuthRequired(String::new()).is_retryable());
        assert!(!FetchError::Decode("eof".into()).is_retryable());
    }
}
