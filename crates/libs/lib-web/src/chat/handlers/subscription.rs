//! # Chat Subscription Handlers
//!
//! Server-sent event streams fed by the [`Relay`].
//!
//! - `GET /api/connections/{id}/stream` - `message_created` events of one
//!   conversation. The access gate runs when the stream opens; a stream that is
//!   already open stays open if the connection changes later.
//! - `GET /api/notifications/stream` - every event touching one of the caller's
//!   connections.
//!
//! Both accept the token as `?access_token=` for `EventSource` clients. A `resync`
//! event means events were dropped and the client should refetch.

use crate::chat::relay::{sse_events, Relay};
use crate::middleware::CurrentUser;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::Stream;
use lib_core::model::access::authorize_chat;
use lib_core::{DbPool, Result};
use std::sync::Arc;
use tracing::info;

pub async fn connection_stream(
    Path(connection_id): Path<i64>,
    State(pool): State<DbPool>,
    State(relay): State<Arc<Relay>>,
    user: CurrentUser,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    authorize_chat(&pool, connection_id, user.id).await?;

    let rx = relay.subscribe_connection(connection_id).await;
    info!("[RELAY] User {} subscribed to connection {}", user.id, connection_id);

    Ok(Sse::new(sse_events(rx)).keep_alive(KeepAlive::default()))
}

pub async fn notification_stream(
    State(relay): State<Arc<Relay>>,
    user: CurrentUser,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let rx = relay.subscribe_user(user.id).await;
    info!("[RELAY] User {} subscribed to notifications", user.id);

    Sse::new(sse_events(rx)).keep_alive(KeepAlive::default())
}
