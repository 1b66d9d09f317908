//! # Authentication Handlers
//!
//! HTTP request handlers for user authentication endpoints.
//!
//! ## Overview
//!
//! - Signup with email/password creates the account and its profile
//! - Login with email/password
//! - Both return a JWT to be sent as `Authorization: Bearer <token>`
//!
//! ## Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::post};
//! use lib_web::handlers::auth::{signup, login};
//!
//! let app = Router::new()
//!     .route("/signup", post(signup))
//!     .route("/login", post(login));
//! ```

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use lib_auth::{encode_jwt, hash_password, verify_password, AuthError};
use lib_core::dto::{AuthResponse, LoginRequest, SignupRequest};
use lib_core::error::is_unique_violation;
use lib_core::model::store::{Profile, ProfileForCreate, ProfileRepository, User, UserRepository};
use lib_core::{AppError, Config, DbPool, Result};
use lib_utils::validation::{validate_email, validate_max_length, validate_not_empty};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};


const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Signup handler - creates a new user account with its profile.
///
/// # Validation
///
/// - Full name must not be empty (at most 100 characters)
/// - Email must be well formed and not registered yet
/// - Password must be at least 8 characters (validated in `hash_password`)
///
/// # Returns
///
/// `201 Created` with the user info and a token.
#[instrument(skip(pool, config, req), fields(email = %req.email, role = %req.role))]
pub async fn signup(
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    info!("[SIGNUP] New signup request");

    let email = req.email.trim().to_lowercase();
    let full_name = req.full_name.trim();

    validate_not_empty(full_name, "Full name").map_err(AppError::InvalidInput)?;
    validate_max_length(full_name, 100, "Full name").map_err(AppError::InvalidInput)?;
    validate_email(&email).map_err(AppError::InvalidInput)?;

    debug!("[SIGNUP] Hashing password...");
    let password_hash = hash_password(&req.password).map_err(auth_error)?;

    // Account and profile are created together or not at all.
    let mut tx = pool.begin().await?;

    let user = UserRepository::create(&mut *tx, &email, &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!("[SIGNUP] Email already registered: {}", email);
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    let profile = ProfileForCreate {
        full_name: full_name.to_string(),
        institution: req.institution.trim().to_string(),
        role: req.role,
    };
    let profile = ProfileRepository::create(&mut *tx, user.id, &profile).await?;

    tx.commit().await?;

    let response = auth_response(&config, &user, &profile, "Account created")?;
    info!("[SIGNUP] Created user {} ({})", user.id, profile.role);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login handler - authenticates with email and password.
///
/// Unknown emails and wrong passwords get the same `401` so the endpoint does not
/// reveal which accounts exist. Deactivated accounts get `403`.
#[instrument(skip(pool, config, req), fields(email = %req.email))]
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Arc<Config>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    info!("[LOGIN] Login attempt");

    let user = UserRepository::find_by_email(&pool, req.email.trim())
        .await?
        .ok_or_else(|| {
            warn!("[LOGIN] Unknown email");
            AppError::Unauthenticated(INVALID_CREDENTIALS.to_string())
        })?;

    if !verify_password(&req.password, &user.password_hash) {
        warn!("[LOGIN] Wrong password for user {}", user.id);
        return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    }

    if !user.is_active {
        warn!("[LOGIN] Inactive account {}", user.id);
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    UserRepository::update_last_login(&pool, user.id).await?;
    let profile = ProfileRepository::get(&pool, user.id).await?;

    let response = auth_response(&config, &user, &profile, "Login successful")?;
    info!("[LOGIN] User {} logged in", user.id);

    Ok(Json(response))
}

fn auth_response(config: &Config, user: &User, profile: &Profile, message: &str) -> Result<AuthResponse> {
    let token = encode_jwt(
        user.id,
        &user.email,
        &profile.role.to_string(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    )
    .map_err(auth_error)?;

    Ok(AuthResponse {
        user: profile.user_info(user),
        token,
        message: message.to_string(),
    })
}

fn auth_error(e: AuthError) -> AppError {
    match e {
        AuthError::WeakPassword(msg) => AppError::InvalidInput(msg),
        other => AppError::Internal(other.to_string()),
    }
}
