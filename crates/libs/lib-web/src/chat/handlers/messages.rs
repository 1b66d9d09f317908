//! # Message Handlers
//!
//! - `GET /api/connections/{id}/messages` - the whole conversation, oldest first
//! - `POST /api/connections/{id}/messages` - append a message
//! - `POST /api/connections/{id}/read` - mark the counterpart's messages read
//!
//! A write may carry a `client_id` (UUID). The stored record echoes it, and a retry
//! with the same `client_id` returns the first record instead of a duplicate.

use crate::chat::{db as chat_db, Relay};
use crate::middleware::CurrentUser;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use lib_core::model::access::authorize_chat;
use lib_core::model::store::MessageForCreate;
use lib_core::{AppError, Config, DbPool, Result};
use shared::dto::{
    Attachment, MarkReadResponse, MessageDto, MessagesListResponse, RelayEvent, SendMessageRequest,
    MAX_MESSAGE_LENGTH,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub async fn list_messages(
    Path(connection_id): Path<i64>,
    State(pool): State<DbPool>,
    user: CurrentUser,
) -> Result<Json<MessagesListResponse>> {
    authorize_chat(&pool, connection_id, user.id).await?;

    let messages = chat_db::list_messages(&pool, connection_id).await?;
    debug!("[CHAT] {} messages on connection {}", messages.len(), connection_id);

    Ok(Json(MessagesListResponse {
        messages: messages.iter().map(|message| message.to_dto()).collect(),
    }))
}

/// Append a message
///
/// Returns `201 Created` for a new record and `200 OK` when `client_id` matched an
/// earlier write. Only new records are pushed to the relay. Writes on one connection
/// are serialized so relay events follow id order.
#[instrument(skip_all, fields(connection_id = connection_id, sender_id = user.id))]
pub async fn send_message(
    Path(connection_id): Path<i64>,
    State(pool): State<DbPool>,
    State(relay): State<Arc<Relay>>,
    State(config): State<Arc<Config>>,
    user: CurrentUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageDto>)> {
    let connection = authorize_chat(&pool, connection_id, user.id).await?;

    let content = req.content.trim().to_string();
    validate_content(&content, req.attachment.is_some())?;
    if let Some(attachment) = &req.attachment {
        validate_attachment(attachment, &config.public_base_url, connection_id)?;
    }
    let client_id = req.client_id.map(validate_client_id).transpose()?;

    let message = MessageForCreate {
        connection_id,
        sender_id: user.id,
        content,
        attachment: req.attachment,
        client_id,
    };
    // Held until the stored record is published.
    let _write_order = relay.lock_connection(connection_id).await;
    let (stored, created) = chat_db::append_message(&pool, &message)
        .await
        .map_err(|e| AppError::WriteFailed(e.to_string()))?;

    let dto = stored.to_dto();
    if !created {
        info!("[CHAT] Replayed write of message {}", dto.id);
        return Ok((StatusCode::OK, Json(dto)));
    }

    info!("[CHAT] Message {} stored", dto.id);
    relay
        .publish(
            &[connection.requester_id, connection.receiver_id],
            RelayEvent::MessageCreated { message: dto.clone() },
        )
        .await;

    Ok((StatusCode::CREATED, Json(dto)))
}

pub async fn mark_read(
    Path(connection_id): Path<i64>,
    State(pool): State<DbPool>,
    user: CurrentUser,
) -> Result<Json<MarkReadResponse>> {
    authorize_chat(&pool, connection_id, user.id).await?;

    let updated = chat_db::mark_read(&pool, connection_id, user.id)
        .await
        .map_err(|e| AppError::WriteFailed(e.to_string()))?;

    Ok(Json(MarkReadResponse { updated }))
}

fn validate_content(content: &str, has_attachment: bool) -> Result<()> {
    if content.is_empty() && !has_attachment {
        return Err(AppError::InvalidInput("Message cannot be empty".to_string()));
    }
    if content.len() > MAX_MESSAGE_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Message must be at most {} bytes",
            MAX_MESSAGE_LENGTH
        )));
    }
    Ok(())
}

/// Attachments must have been uploaded to this connection first.
fn validate_attachment(attachment: &Attachment, public_base_url: &str, connection_id: i64) -> Result<()> {
    let prefix = format!("{}/attachments/{}/", public_base_url.trim_end_matches('/'), connection_id);
    if !attachment.url.starts_with(&prefix) || attachment.url.len() == prefix.len() {
        return Err(AppError::InvalidInput(
            "Attachment must be uploaded to this conversation first".to_string(),
        ));
    }
    if attachment.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Attachment name cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_client_id(client_id: String) -> Result<String> {
    Uuid::parse_str(&client_id)
        .map(|_| client_id)
        .map_err(|_| AppError::InvalidInput("client_id must be a UUID".to_string()))
}
