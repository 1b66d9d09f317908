//! # Connection Handlers
//!
//! HTTP endpoints for the connection lifecycle.
//!
//! ## Endpoints
//!
//! - `POST /api/connections` - Send a connection request
//! - `GET /api/connections[?status=]` - List the caller's connections, both directions
//! - `POST /api/connections/{id}/status` - Accept or reject (receiver only)
//! - `GET /api/conversations` - Accepted connections with their latest activity
//!
//! Creating and answering a request both push an event to the two participants'
//! notification streams.

use crate::chat::{db as chat_db, Relay};
use crate::middleware::CurrentUser;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use lib_core::error::is_unique_violation;
use lib_core::model::lifecycle;
use lib_core::model::store::connection_repository::ConnectionWithCounterpart;
use lib_core::model::store::{Connection, ConnectionRepository, ProfileRepository, UserRepository};
use lib_core::{AppError, DbPool, Result};
use lib_utils::time::format_time;
use shared::dto::{
    ConnectionStatus, ConnectionView, ConnectionsListResponse, ConnectionsQuery, ConversationSummary,
    ConversationsListResponse, CreateConnectionRequest, ProfileSummary, RelayEvent, UpdateStatusRequest,
};
use shared::utils::preview;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[cfg(test)]
mod tests;

const PREVIEW_CHARS: usize = 80;

/// Send a connection request
#[instrument(skip_all, fields(requester_id = user.id, receiver_id = req.receiver_id))]
pub async fn create_connection(
    State(pool): State<DbPool>,
    State(relay): State<Arc<Relay>>,
    user: CurrentUser,
    Json(req): Json<CreateConnectionRequest>,
) -> Result<(StatusCode, Json<ConnectionView>)> {
    if req.receiver_id == user.id {
        return Err(AppError::SelfConnection("Cannot connect with yourself".to_string()));
    }

    let receiver_active = UserRepository::find_by_id(&pool, req.receiver_id)
        .await?
        .is_some_and(|receiver| receiver.is_active);
    let receiver = match ProfileRepository::find(&pool, req.receiver_id).await? {
        Some(profile) if receiver_active => profile,
        _ => return Err(AppError::NotFound("User not found".to_string())),
    };

    let connection = ConnectionRepository::create(&pool, user.id, req.receiver_id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!("[CONNECTIONS] Pair {} / {} already connected", user.id, req.receiver_id);
                AppError::DuplicateConnection("A connection between these users already exists".to_string())
            } else {
                AppError::WriteFailed(e.to_string())
            }
        })?;

    info!("[CONNECTIONS] Request {} created", connection.id);
    relay
        .publish(
            &[connection.requester_id, connection.receiver_id],
            RelayEvent::ConnectionRequested { connection: connection.to_dto() },
        )
        .await;

    Ok((StatusCode::CREATED, Json(view(&connection, user.id, receiver.summary()))))
}

/// List connections where the caller is requester or receiver, newest first
pub async fn list_connections(
    State(pool): State<DbPool>,
    user: CurrentUser,
    Query(query): Query<ConnectionsQuery>,
) -> Result<Json<ConnectionsListResponse>> {
    let rows = ConnectionRepository::list_for_user(&pool, user.id, query.status).await?;

    let connections = rows.into_iter().map(|row| row_view(row, user.id)).collect();
    Ok(Json(ConnectionsListResponse { connections }))
}

/// Accept or reject a pending request
///
/// Only the receiver may answer, and only once: the write is conditional on the
/// connection still being pending, so of two racing answers one gets
/// `InvalidTransition`.
#[instrument(skip_all, fields(connection_id = id, actor_id = user.id, status = %req.status))]
pub async fn update_connection_status(
    Path(id): Path<i64>,
    State(pool): State<DbPool>,
    State(relay): State<Arc<Relay>>,
    user: CurrentUser,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ConnectionView>> {
    let connection = ConnectionRepository::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Connection not found".to_string()))?;

    lifecycle::authorize_update(&connection, user.id, req.status)?;

    let updated = ConnectionRepository::update_status_if_pending(&pool, id, req.status)
        .await
        .map_err(|e| AppError::WriteFailed(e.to_string()))?
        .ok_or_else(|| AppError::InvalidTransition("Connection was already answered".to_string()))?;

    info!("[CONNECTIONS] Connection {} is now {}", id, updated.status);
    relay
        .publish(
            &[updated.requester_id, updated.receiver_id],
            RelayEvent::ConnectionUpdated { connection: updated.to_dto() },
        )
        .await;

    let requester = ProfileRepository::get(&pool, updated.requester_id).await?;
    Ok(Json(view(&updated, user.id, requester.summary())))
}

/// Accepted connections with last message and unread count, most recent activity first
pub async fn list_conversations(
    State(pool): State<DbPool>,
    user: CurrentUser,
) -> Result<Json<ConversationsListResponse>> {
    let rows = ConnectionRepository::list_for_user(&pool, user.id, Some(ConnectionStatus::Accepted)).await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let last = chat_db::last_message(&pool, row.id).await?;
        let unread_count = chat_db::unread_count(&pool, row.id, user.id).await?;
        let last_activity = last.as_ref().map_or(row.created_at, |message| message.created_at);

        let last_message_preview = last.as_ref().map(|message| match message.attachment() {
            Some(attachment) if message.content.trim().is_empty() => format!("Attachment: {}", attachment.name),
            _ => preview(&message.content, PREVIEW_CHARS),
        });

        entries.push((
            last_activity,
            ConversationSummary {
                connection_id: row.id,
                counterpart: counterpart_summary(&row),
                last_message: last.map(|message| message.to_dto()),
                last_message_preview,
                unread_count,
                last_activity_at: format_time(last_activity),
            },
        ));
    }

    entries.sort_by(|a, b| b.0.cmp(&a.0));
    let conversations = entries.into_iter().map(|(_, summary)| summary).collect();

    Ok(Json(ConversationsListResponse { conversations }))
}

fn view(connection: &Connection, user_id: i64, counterpart: ProfileSummary) -> ConnectionView {
    ConnectionView {
        id: connection.id,
        requester_id: connection.requester_id,
        receiver_id: connection.receiver_id,
        status: connection.status,
        created_at: format_time(connection.created_at),
        is_requester: connection.requester_id == user_id,
        counterpart,
    }
}

fn counterpart_summary(row: &ConnectionWithCounterpart) -> ProfileSummary {
    ProfileSummary {
        id: row.counterpart_id,
        full_name: row.counterpart_name.clone(),
        institution: row.counterpart_institution.clone(),
        role: row.counterpart_role,
    }
}

fn row_view(row: ConnectionWithCounterpart, user_id: i64) -> ConnectionView {
    ConnectionView {
        counterpart: counterpart_summary(&row),
        id: row.id,
        requester_id: row.requester_id,
        receiver_id: row.receiver_id,
        status: row.status,
        created_at: format_time(row.created_at),
        is_requester: row.requester_id == user_id,
    }
}
