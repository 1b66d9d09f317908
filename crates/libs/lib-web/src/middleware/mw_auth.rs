//! # Authentication Extractor
//!
//! Resolves the caller from a JWT. Handlers take a [`CurrentUser`] argument; a missing,
//! malformed or expired token rejects the request with `401 Unauthenticated` before
//! the handler runs.
//!
//! The token is read from `Authorization: Bearer <token>`. Browsers cannot set
//! headers on an `EventSource`, so the SSE routes also accept `?access_token=<token>`.
//!
//! ```rust,ignore
//! use lib_web::middleware::CurrentUser;
//!
//! async fn whoami(user: CurrentUser) -> String {
//!     format!("Hello, user {}!", user.id)
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use lib_auth::{bearer_token, decode_jwt};
use lib_core::{AppError, Config};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: String,
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<Config>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or_else(|| {
            debug!("[AUTH] Missing bearer token for {}", parts.uri.path());
            AppError::Unauthenticated("Missing bearer token".to_string())
        })?;

        let config = Arc::<Config>::from_ref(state);
        let claims = decode_jwt(&token, &config.jwt_secret).map_err(|e| {
            warn!("[AUTH] JWT validation failed: {}", e);
            AppError::Unauthenticated("Invalid or expired token".to_string())
        })?;

        let id = claims
            .user_id()
            .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

        debug!("[AUTH] Authenticated user: {} (id: {})", claims.email, id);

        Ok(CurrentUser { id, email: claims.email, role: claims.role })
    }
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.access_token)
            .filter(|token| !token.is_empty())
    })
}
