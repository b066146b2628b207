//! Client error types

use serde_json::Value;
use shared::{AppError, ErrorCode, ProductId};
use std::collections::HashMap;
use thiserror::Error;

/// Transport-level error talking to the catalog API
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Structured error body returned by the API
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: ErrorCode,
        message: String,
        details: Option<HashMap<String, Value>>,
    },

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local filesystem error (download persistence)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn from_app_error(status: u16, err: AppError) -> Self {
        ClientError::Api {
            status,
            code: err.code,
            message: err.message,
            details: err.details,
        }
    }

    /// Error code, when the failure maps onto one
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Api { code, .. } => *code,
            ClientError::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            ClientError::Http(_) => ErrorCode::NetworkError,
            ClientError::Unauthorized => ErrorCode::NotAuthenticated,
            ClientError::Forbidden(_) => ErrorCode::PermissionDenied,
            ClientError::NotFound(_) => ErrorCode::NotFound,
            ClientError::Validation(_) => ErrorCode::ValidationFailed,
            ClientError::InvalidResponse(_) | ClientError::Serialization(_) => {
                ErrorCode::InvalidFormat
            }
            ClientError::Internal(_) | ClientError::Io(_) => ErrorCode::InternalError,
        }
    }

    /// Worth trying again without changing the request
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            other => other.code().category().is_transient(),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Grid-level failure surfaced to the render layer
///
/// None of these end the session; each maps to a visible, retryable state.
#[derive(Debug, Error)]
pub enum GridError {
    /// List read failed; rows already on screen are kept
    #[error("Failed to load products: {0}")]
    Fetch(#[from] ClientError),

    /// Field update rejected; the row has been re-synced
    #[error("Failed to update {field} on product {row_id}: {source}")]
    Mutation {
        row_id: ProductId,
        field: String,
        #[source]
        source: ClientError,
    },

    /// Client-side check failed; the edit stays open
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Download still failing after the retry budget
    #[error("Download failed after {attempts} attempts: {source}")]
    Download {
        attempts: u32,
        #[source]
        source: ClientError,
    },

    #[error("No cell is being edited")]
    NoActiveEdit,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),
}

impl GridError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        GridError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Field the error concerns, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            GridError::Mutation { field, .. } | GridError::Validation { field, .. } => Some(field),
            GridError::UnknownField(field) => Some(field),
            _ => None,
        }
    }
}

/// Result type for grid operations
pub type GridResult<T> = Result<T, GridError>;
