//! Webhook error types.

use statamic_core::ApiError;
use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook operations.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The remote event registry could not be reached or rejected the call.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Data required before installation can proceed is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A registry response or delivery body has an unexpected shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebhookError {
    /// Returns true when the registry answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WebhookError::Api(err) if err.status_code() == Some(404))
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::InvalidPayload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = WebhookError::Api(ApiError::Status {
            status: 404,
            body: String::new(),
        });
        assert!(err.is_not_found());

        let err = WebhookError::Api(ApiError::Status {
            status: 500,
            body: String::new(),
        });
        assert!(!err.is_not_found());
        assert!(!WebhookError::Configuration("x".into()).is_not_found());
    }

    #[test]
    fn test_api_error_is_transparent() {
        let err: WebhookError = ApiError::Timeout.into();
        assert_eq!(err.to_string(), "Request timeout");
    }
}
