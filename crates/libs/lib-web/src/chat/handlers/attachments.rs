//! # Attachment Upload Handler
//!
//! `POST /api/connections/{id}/attachments?name=<file name>` with the raw file as the
//! body and its type in `Content-Type`. The object is stored under
//! `{connection_id}/{generated name}` and the returned [`Attachment`] is what the
//! client then sends along with its message.

use crate::middleware::CurrentUser;
use crate::services::object_store::{attachment_key, public_url};
use crate::services::ObjectStore;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Json, Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
};
use lib_core::model::access::authorize_chat;
use lib_core::{AppError, Config, DbPool, Result};
use shared::dto::{Attachment, AttachmentUploadQuery, MAX_ATTACHMENT_BYTES};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[instrument(skip_all, fields(connection_id = connection_id, user_id = user.id))]
pub async fn upload_attachment(
    Path(connection_id): Path<i64>,
    Query(query): Query<AttachmentUploadQuery>,
    State(pool): State<DbPool>,
    State(objects): State<Arc<dyn ObjectStore>>,
    State(config): State<Arc<Config>>,
    user: CurrentUser,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Attachment>)> {
    authorize_chat(&pool, connection_id, user.id).await?;

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            warn!("[UPLOAD] Rejected body over the request limit");
            too_large()
        } else {
            AppError::InvalidInput(rejection.body_text())
        }
    })?;

    if body.len() > MAX_ATTACHMENT_BYTES {
        warn!("[UPLOAD] Rejected {} bytes", body.len());
        return Err(too_large());
    }
    if body.is_empty() {
        return Err(AppError::InvalidInput("Attachment is empty".to_string()));
    }

    let name = display_name(&query.name)
        .ok_or_else(|| AppError::InvalidInput("Attachment name cannot be empty".to_string()))?;

    let mime_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();

    let key = attachment_key(connection_id, &name);
    objects
        .put(&key, &body)
        .await
        .map_err(|e| AppError::UploadFailed(e.to_string()))?;

    info!("[UPLOAD] Stored {} ({} bytes) as {}", name, body.len(), key);

    Ok((
        StatusCode::CREATED,
        Json(Attachment {
            url: public_url(&config.public_base_url, &key),
            name,
            mime_type,
        }),
    ))
}

fn too_large() -> AppError {
    AppError::AttachmentTooLarge(format!(
        "Attachments are limited to {} MiB",
        MAX_ATTACHMENT_BYTES / (1024 * 1024)
    ))
}

/// The last path segment of the client's file name, trimmed.
fn display_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    (!name.is_empty()).then(|| name.to_string())
}
