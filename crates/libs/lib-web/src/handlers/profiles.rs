//! # Profile Handlers
//!
//! - `GET /api/profiles/me` - own profile
//! - `PUT /api/profiles/me` - partial update of own profile
//! - `GET /api/profiles/{user_id}` - any user's public profile

use crate::middleware::CurrentUser;
use axum::extract::{Json, Path, State};
use lib_core::model::store::ProfileRepository;
use lib_core::{AppError, DbPool, Result};
use lib_utils::validation::{validate_max_length, validate_not_empty};
use shared::dto::{ProfileDto, ProfileUpdateRequest};
use tracing::{info, instrument};

const MAX_BIO_LENGTH: usize = 2_000;

pub async fn get_my_profile(State(pool): State<DbPool>, user: CurrentUser) -> Result<Json<ProfileDto>> {
    load(&pool, user.id).await.map(Json)
}

#[instrument(skip(pool, update), fields(user_id = user.id))]
pub async fn update_my_profile(
    State(pool): State<DbPool>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileDto>> {
    if let Some(full_name) = &update.full_name {
        validate_not_empty(full_name, "Full name").map_err(AppError::InvalidInput)?;
        validate_max_length(full_name.trim(), 100, "Full name").map_err(AppError::InvalidInput)?;
    }
    if let Some(bio) = &update.bio {
        validate_max_length(bio, MAX_BIO_LENGTH, "Bio").map_err(AppError::InvalidInput)?;
    }

    // Make sure the profile exists before building an UPDATE for it.
    load(&pool, user.id).await?;

    let profile = ProfileRepository::update(&pool, user.id, &update).await?;
    info!("[PROFILES] Updated profile of user {}", user.id);

    Ok(Json(profile.to_dto()))
}

pub async fn get_profile(
    State(pool): State<DbPool>,
    _user: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<ProfileDto>> {
    load(&pool, user_id).await.map(Json)
}

async fn load(pool: &DbPool, user_id: i64) -> Result<ProfileDto> {
    ProfileRepository::find(pool, user_id)
        .await?
        .map(|profile| profile.to_dto())
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}
