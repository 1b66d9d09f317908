//! # Authentication Library
//!
//! Password hashing (Argon2) and bearer token management (JWT).

pub mod error;
pub mod pwd;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use pwd::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
pub use token::{bearer_token, decode_jwt, encode_jwt, Claims};
