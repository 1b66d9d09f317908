//! # Chat Access Gate
//!
//! A user may read or write a conversation only while they take part in its
//! connection and the connection is accepted. The check runs against the store on
//! every chat request and is never cached, so a status change applies to the next
//! request.

use crate::error::{AppError, Result};
use crate::model::store::{Connection, ConnectionRepository, DbPool};
use shared::dto::ConnectionStatus;
use tracing::debug;

/// Decide access for an already loaded connection.
///
/// Failures are reported in this order: `NotFound`, `Forbidden`, `NotAccepted`.
pub fn check_chat_access(connection: Option<Connection>, user_id: i64) -> Result<Connection> {
    let connection = connection.ok_or_else(|| AppError::NotFound("Connection not found".to_string()))?;

    if !connection.is_participant(user_id) {
        return Err(AppError::Forbidden(
            "You are not a participant of this connection".to_string(),
        ));
    }

    if connection.status != ConnectionStatus::Accepted {
        return Err(AppError::NotAccepted(format!(
            "Chat is available once the connection is accepted (current status: {})",
            connection.status
        )));
    }

    Ok(connection)
}

/// Load the connection and run the gate.
pub async fn authorize_chat(pool: &DbPool, connection_id: i64, user_id: i64) -> Result<Connection> {
    let connection = ConnectionRepository::find_by_id(pool, connection_id).await?;

    check_chat_access(connection, user_id).inspect_err(|e| {
        debug!("[GATE] user {} denied on connection {}: {}", user_id, connection_id, e.code());
    })
}
