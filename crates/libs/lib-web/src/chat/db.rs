//! # Database Operations for Chat Messages
//!
//! Messages are append-only. Reads are ordered by row id, which is the append order.
//! Callers are expected to have run the access gate first.

use chrono::Utc;
use lib_core::error::is_unique_violation;
use lib_core::model::store::{Message, MessageForCreate};
use lib_core::DbPool;
use sqlx::query_as;

/// Every message of a connection, oldest first.
pub async fn list_messages(pool: &DbPool, connection_id: i64) -> Result<Vec<Message>, sqlx::Error> {
    query_as::<_, Message>("SELECT * FROM messages WHERE connection_id = ? ORDER BY id ASC")
        .bind(connection_id)
        .fetch_all(pool)
        .await
}

pub async fn find_by_client_id(
    pool: &DbPool,
    connection_id: i64,
    client_id: &str,
) -> Result<Option<Message>, sqlx::Error> {
    query_as::<_, Message>("SELECT * FROM messages WHERE connection_id = ? AND client_id = ?")
        .bind(connection_id)
        .bind(client_id)
        .fetch_optional(pool)
        .await
}

/// Append a message and return the stored record.
///
/// Idempotent on `client_id`: a repeated write returns the first record and the
/// flag is `false`.
pub async fn append_message(
    pool: &DbPool,
    message: &MessageForCreate,
) -> Result<(Message, bool), sqlx::Error> {
    if let Some(client_id) = &message.client_id {
        if let Some(existing) = find_by_client_id(pool, message.connection_id, client_id).await? {
            return Ok((existing, false));
        }
    }

    let attachment = message.attachment.as_ref();
    let inserted = query_as::<_, Message>(
        r#"
        INSERT INTO messages
            (connection_id, sender_id, content, attachment_url, attachment_name, attachment_type, client_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(message.connection_id)
    .bind(message.sender_id)
    .bind(&message.content)
    .bind(attachment.map(|a| a.url.as_str()))
    .bind(attachment.map(|a| a.name.as_str()))
    .bind(attachment.map(|a| a.mime_type.as_str()))
    .bind(message.client_id.as_deref())
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    match (inserted, &message.client_id) {
        (Ok(stored), _) => Ok((stored, true)),
        // Lost a race against a retry of the same write.
        (Err(e), Some(client_id)) if is_unique_violation(&e) => {
            let existing = find_by_client_id(pool, message.connection_id, client_id).await?;
            existing.map(|m| (m, false)).ok_or(e)
        }
        (Err(e), _) => Err(e),
    }
}

pub async fn last_message(pool: &DbPool, connection_id: i64) -> Result<Option<Message>, sqlx::Error> {
    query_as::<_, Message>("SELECT * FROM messages WHERE connection_id = ? ORDER BY id DESC LIMIT 1")
        .bind(connection_id)
        .fetch_optional(pool)
        .await
}

/// Messages sent to `reader_id` on this connection that are still unread.
pub async fn unread_count(pool: &DbPool, connection_id: i64, reader_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM messages WHERE connection_id = ? AND sender_id <> ? AND read = 0",
    )
    .bind(connection_id)
    .bind(reader_id)
    .fetch_one(pool)
    .await
}

/// Mark everything the counterpart sent as read. Returns the number of rows changed.
pub async fn mark_read(pool: &DbPool, connection_id: i64, reader_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE messages SET read = 1 WHERE connection_id = ? AND sender_id <> ? AND read = 0",
    )
    .bind(connection_id)
    .bind(reader_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
