//! # Authentication Data Transfer Objects
//!
//! Defines request and response structures for authentication endpoints.
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /api/auth/signup` - [`SignupRequest`] -> [`AuthResponse`]
//! - `POST /api/auth/login` - [`LoginRequest`] -> [`AuthResponse`]
//!
//! Every other endpoint expects the returned token as `Authorization: Bearer <token>`.
//!
//! ## Login Flow
//!
//! ```text
//! POST /api/auth/login
//! Content-Type: application/json
//!
//! {
//!   "email": "ada@example.com",
//!   "password": "MyPassword123!"
//! }
//! ```
//!
//! Response:
//! ```text
//! {
//!   "user": {
//!     "id": 1,
//!     "email": "ada@example.com",
//!     "full_name": "Ada Lovelace",
//!     "role": "student",
//!     "created_at": "2025-01-01T00:00:00Z"
//!   },
//!   "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
//!   "message": "Login successful"
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::profiles::UserRole;

/// Login request with email and password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup request.
///
/// Creates both the account and its profile. The role decides whether the user
/// shows up as a mentor (alumni) or as a mentee (student).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub institution: String,
}

/// Public information about the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: String,
}

/// Authentication response returned by signup and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub token: String,
    pub message: String,
}

/// Standard error body returned by every endpoint.
///
/// `code` is stable and machine readable (e.g. `NotAccepted`, `DuplicateConnection`),
/// `error` is a short human readable notice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub code: String,
}
