//! # Connection Repository
//!
//! Persists directed connection requests.
//!
//! The schema carries two guarantees the code relies on:
//! - a CHECK constraint rejects `requester_id = receiver_id`;
//! - a unique index over `(MIN(requester_id, receiver_id), MAX(...))` allows one
//!   connection per unordered pair, so a reverse request also fails.
//!
//! Status changes go through [`ConnectionRepository::update_status_if_pending`], a
//! conditional write: of two racing updates on the same pending row, exactly one
//! wins.

use super::models::Connection;
use super::DbPool;
use chrono::{DateTime, Utc};
use shared::dto::{ConnectionStatus, UserRole};
use sqlx::{query_as, FromRow};

/// A connection joined with the public summary of the other participant.
#[derive(Debug, Clone, FromRow)]
pub struct ConnectionWithCounterpart {
    pub id: i64,
    pub requester_id: i64,
    pub receiver_id: i64,
    #[sqlx(try_from = "String")]
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub counterpart_id: i64,
    pub counterpart_name: String,
    pub counterpart_institution: String,
    #[sqlx(try_from = "String")]
    pub counterpart_role: UserRole,
}

pub struct ConnectionRepository;

impl ConnectionRepository {
    /// Insert a pending connection.
    ///
    /// # Errors
    ///
    /// A UNIQUE violation when the pair already has a connection in either direction,
    /// a CHECK violation for a self connection, a FOREIGN KEY violation when either
    /// user does not exist.
    pub async fn create(
        pool: &DbPool,
        requester_id: i64,
        receiver_id: i64,
    ) -> Result<Connection, sqlx::Error> {
        let now = Utc::now();

        query_as::<_, Connection>(
            r#"
            INSERT INTO connections (requester_id, receiver_id, status, created_at, updated_at)
            VALUES (?, ?, 'pending', ?, ?)
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(receiver_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Connection>, sqlx::Error> {
        query_as::<_, Connection>("SELECT * FROM connections WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every connection the user takes part in, newest first, with the counterpart's summary.
    pub async fn list_for_user(
        pool: &DbPool,
        user_id: i64,
        status: Option<ConnectionStatus>,
    ) -> Result<Vec<ConnectionWithCounterpart>, sqlx::Error> {
        query_as::<_, ConnectionWithCounterpart>(
            r#"
            SELECT
                c.id,
                c.requester_id,
                c.receiver_id,
                c.status,
                c.created_at,
                p.user_id AS counterpart_id,
                p.full_name AS counterpart_name,
                p.institution AS counterpart_institution,
                p.role AS counterpart_role
            FROM connections c
            JOIN profiles p ON p.user_id = CASE
                WHEN c.requester_id = ? THEN c.receiver_id
                ELSE c.requester_id
            END
            WHERE (c.requester_id = ? OR c.receiver_id = ?)
              AND (? IS NULL OR c.status = ?)
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await
    }

    /// Move a pending connection to `status`.
    ///
    /// Returns `None` when the row was not pending any more (or does not exist);
    /// nothing is written in that case.
    pub async fn update_status_if_pending(
        pool: &DbPool,
        id: i64,
        status: ConnectionStatus,
    ) -> Result<Option<Connection>, sqlx::Error> {
        query_as::<_, Connection>(
            r#"
            UPDATE connections
            SET status = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
