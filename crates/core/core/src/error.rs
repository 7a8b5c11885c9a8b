//! Error types for the Statamic private API client.
//!
//! This module defines the `ApiError` enum which represents everything that
//! can go wrong while building or sending a request to the private API.

use thiserror::Error;

/// The main error type for private API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    // ==================== Transport Errors ====================
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The request timed out.
    #[error("Request timeout")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ==================== Request Errors ====================
    /// A parameter required to build the request path is missing.
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },

    /// The resource or operation name is not known.
    #[error("Unknown {kind}: {value}")]
    Unknown { kind: &'static str, value: String },

    // ==================== Configuration Errors ====================
    /// The stored credentials cannot be used.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl ApiError {
    /// Creates a new missing parameter error.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Returns true if the failure happened on the wire rather than while
    /// preparing the request.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Timeout | Self::Status { .. } | Self::InvalidResponse(_)
        )
    }

    /// Returns the HTTP status the API answered with, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidResponse(err.to_string())
    }
}
