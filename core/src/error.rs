//! Error types and HTTP status mapping

use serde::Serialize;
use thiserror::Error;

/// Result type alias for key selection and identity mapping
pub type Result<T> = std::result::Result<T, ApiError>;

/// Authentication error with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key set could not be fetched, parsed, or matched against the token
    #[error("key selection failed: {message}")]
    KeySelection { message: String },

    /// Claims do not carry the required institutional identity
    #[error("access denied: {message}")]
    Authorization { message: String },

    /// Claims are well-formed but hold no usable identity
    #[error("invalid identity data: {message}")]
    AuthenticationData { message: String },

    /// Account or profile store failure, passed through untouched
    #[error("account store error: {message}")]
    Store { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },

    #[error("upstream error: {message}")]
    UpstreamError { message: String },

    #[error("upstream timeout")]
    UpstreamTimeout,
}

impl ApiError {
    pub fn key_selection(message: impl Into<String>) -> Self {
        Self::KeySelection {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn authentication_data(message: impl Into<String>) -> Self {
        Self::AuthenticationData {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn upstream_error(message: impl Into<String>) -> Self {
        Self::UpstreamError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::KeySelection { .. } => 502,
            Self::Authorization { .. } => 403,
            Self::AuthenticationData { .. } => 401,
            Self::Store { .. } => 500,
            Self::InvalidRequest { .. } => 400,
            Self::Internal { .. } => 500,
            Self::UpstreamError { .. } => 502,
            Self::UpstreamTimeout => 504,
        }
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::KeySelection { .. } => "key_selection_failed",
            Self::Authorization { .. } => "access_denied",
            Self::AuthenticationData { .. } => "invalid_identity_data",
            Self::Store { .. } => "account_store_error",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Internal { .. } => "internal_error",
            Self::UpstreamError { .. } => "upstream_error",
            Self::UpstreamTimeout => "upstream_timeout",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.error_key().to_string(),
            message: err.to_string(),
        }
    }
}
