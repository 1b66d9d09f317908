//! # Connection Lifecycle
//!
//! ```text
//!            accept
//!   pending ────────► accepted
//!      │
//!      └────────────► rejected
//!            reject
//! ```
//!
//! `accepted` and `rejected` are terminal. Only the receiver may move a request out
//! of `pending`.

use crate::error::{AppError, Result};
use crate::model::store::Connection;
use shared::dto::ConnectionStatus;

/// Check that `target` is reachable from `current`.
pub fn check_transition(current: ConnectionStatus, target: ConnectionStatus) -> Result<()> {
    if target == ConnectionStatus::Pending {
        return Err(AppError::InvalidTransition(
            "A connection cannot be moved back to pending".to_string(),
        ));
    }
    if current.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "Connection is already {}",
            current
        )));
    }
    Ok(())
}

/// Check that `actor_id` is the receiver of `connection`.
pub fn check_actor(connection: &Connection, actor_id: i64) -> Result<()> {
    if connection.receiver_id != actor_id {
        return Err(AppError::Unauthorized(
            "Only the receiver can respond to a connection request".to_string(),
        ));
    }
    Ok(())
}

/// Both checks, in the order the API reports them.
pub fn authorize_update(connection: &Connection, actor_id: i64, target: ConnectionStatus) -> Result<()> {
    check_actor(connection, actor_id)?;
    check_transition(connection.status, target)
}
