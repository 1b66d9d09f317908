//! # Client Errors
//!
//! Every failed call carries the server's stable `code` when there is one, so a UI
//! can tell a closed conversation (`NotAccepted`) from a network hiccup.

use shared::dto::ErrorResponse;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response. `code` is empty when the body was not an error document.
    #[error("API error ({status} {code}): {message}")]
    Api { status: u16, code: String, message: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Attachment is {size} bytes, the limit is {limit} bytes")]
    AttachmentTooLarge { size: usize, limit: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl ClientError {
    /// Build an `Api` error from a status and a raw response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(err) => ClientError::Api {
                status,
                code: err.code,
                message: err.error,
            },
            Err(_) => ClientError::Api {
                status,
                code: String::new(),
                message: if body.is_empty() { "Unknown error".to_string() } else { body.to_string() },
            },
        }
    }

    /// Server error code, or the local equivalent for checks done before any call.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } if !code.is_empty() => Some(code),
            ClientError::AttachmentTooLarge { .. } => Some("AttachmentTooLarge"),
            ClientError::InvalidInput(_) => Some("InvalidInput"),
            _ => None,
        }
    }

    /// The conversation is not open to this user: leave the chat view.
    pub fn is_gate_failure(&self) -> bool {
        matches!(self.code(), Some("NotFound" | "Forbidden" | "NotAccepted"))
    }

    /// The token is missing or expired: go back to login.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
