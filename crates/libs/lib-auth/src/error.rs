//! # Authentication Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    WeakPassword(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Failed to encode JWT: {0}")]
    TokenEncode(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}
