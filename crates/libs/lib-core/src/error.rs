//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used consistently
//! across the store, the domain rules and the HTTP handlers.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx)
//!    - [`InvalidInput`](AppError::InvalidInput), [`SelfConnection`](AppError::SelfConnection) → 400
//!    - [`Unauthenticated`](AppError::Unauthenticated) → 401
//!    - [`Unauthorized`](AppError::Unauthorized), [`Forbidden`](AppError::Forbidden),
//!      [`NotAccepted`](AppError::NotAccepted) → 403
//!    - [`NotFound`](AppError::NotFound) → 404
//!    - [`DuplicateConnection`](AppError::DuplicateConnection),
//!      [`InvalidTransition`](AppError::InvalidTransition), [`Conflict`](AppError::Conflict) → 409
//!    - [`AttachmentTooLarge`](AppError::AttachmentTooLarge) → 413
//!
//! 2. **Server Errors** (5xx)
//!    - [`WriteFailed`](AppError::WriteFailed), [`Config`](AppError::Config),
//!      [`Internal`](AppError::Internal) → 500
//!    - [`UploadFailed`](AppError::UploadFailed) → 502 (object store)
//!
//! Every error renders as `{"error": <message>, "code": <variant name>}`. Clients
//! branch on `code`; the message is for people.
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn check_receiver(requester_id: i64, receiver_id: i64) -> Result<()> {
//!     if requester_id == receiver_id {
//!         return Err(AppError::SelfConnection("Cannot connect with yourself".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type covering all error scenarios.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing, malformed or expired bearer token.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller is a participant but lacks the right for this action,
    /// e.g. the requester trying to accept their own request.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is not a participant of the connection.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The connection exists but is not accepted, so chat is closed.
    #[error("Connection not accepted: {0}")]
    NotAccepted(String),

    /// Requested resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A connection already exists for this pair of users, in either direction.
    #[error("Duplicate connection: {0}")]
    DuplicateConnection(String),

    #[error("Self connection: {0}")]
    SelfConnection(String),

    /// Status change from a terminal state, or back to `pending`.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// **HTTP Status**: 413 Payload Too Large
    #[error("Attachment too large: {0}")]
    AttachmentTooLarge(String),

    /// Object store failure.
    ///
    /// **HTTP Status**: 502 Bad Gateway
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The store rejected or failed a write.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Invalid user input validation error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness conflict outside connections (e.g. email already registered).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (unexpected failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::SelfConnection(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) | AppError::Forbidden(_) | AppError::NotAccepted(_) => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateConnection(_)
            | AppError::InvalidTransition(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::AttachmentTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::WriteFailed(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code, the variant name.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotAccepted(_) => "NotAccepted",
            AppError::NotFound(_) => "NotFound",
            AppError::DuplicateConnection(_) => "DuplicateConnection",
            AppError::SelfConnection(_) => "SelfConnection",
            AppError::InvalidTransition(_) => "InvalidTransition",
            AppError::AttachmentTooLarge(_) => "AttachmentTooLarge",
            AppError::UploadFailed(_) => "UploadFailed",
            AppError::WriteFailed(_) => "WriteFailed",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Conflict(_) => "Conflict",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Get a user-friendly error message.
    ///
    /// For server-side failures, returns a generic message to avoid exposing implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthenticated(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotAccepted(msg)
            | AppError::NotFound(msg)
            | AppError::DuplicateConnection(msg)
            | AppError::SelfConnection(msg)
            | AppError::InvalidTransition(msg)
            | AppError::AttachmentTooLarge(msg)
            | AppError::InvalidInput(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::UploadFailed(_) => "Failed to upload attachment, please try again".to_string(),
            AppError::WriteFailed(_) => "Failed to save, please try again".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Server error: {}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        let body = Json(json!({
            "error": self.user_message(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

/// True when `err` is a UNIQUE constraint violation.
///
/// Callers map it to the domain error that fits (duplicate connection, duplicate email).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Internal(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_map_to_distinct_codes() {
        let not_found = AppError::NotFound("Connection not found".to_string());
        let forbidden = AppError::Forbidden("Not a participant".to_string());
        let not_accepted = AppError::NotAccepted("Connection is pending".to_string());

        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(not_accepted.status_code(), StatusCode::FORBIDDEN);
        assert_ne!(forbidden.code(), not_accepted.code());
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::WriteFailed("disk I/O error at page 12".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_message().contains("disk"));
    }

    #[test]
    fn test_attachment_too_large_is_413() {
        let err = AppError::AttachmentTooLarge("File exceeds 5 MiB".to_string());
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.user_message(), "File exceeds 5 MiB");
    }
}
