//! # Connection Data Transfer Objects
//!
//! A connection is a directed request from a requester to a receiver. Only the
//! receiver may accept or reject it, and only an accepted connection opens a chat.
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /api/connections` - [`CreateConnectionRequest`] -> [`ConnectionView`]
//! - `GET /api/connections` - [`ConnectionsListResponse`]
//! - `POST /api/connections/{id}/status` - [`UpdateStatusRequest`] -> [`ConnectionView`]
//! - `GET /api/conversations` - [`ConversationsListResponse`]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::messaging::MessageDto;
use super::profiles::ProfileSummary;

/// Lifecycle status of a connection.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConnectionStatus::Pending)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ConnectionStatus::Pending),
            "accepted" => Ok(ConnectionStatus::Accepted),
            "rejected" => Ok(ConnectionStatus::Rejected),
            _ => Err(format!("Invalid connection status: {}", s)),
        }
    }
}

impl TryFrom<String> for ConnectionStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Send a connection request to another user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConnectionRequest {
    pub receiver_id: i64,
}

/// Accept or reject a pending request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ConnectionStatus,
}

/// Raw connection record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDto {
    pub id: i64,
    pub requester_id: i64,
    pub receiver_id: i64,
    pub status: ConnectionStatus,
    pub created_at: String,
}

/// A connection as seen by one of its participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionView {
    pub id: i64,
    pub requester_id: i64,
    pub receiver_id: i64,
    pub status: ConnectionStatus,
    pub created_at: String,
    pub is_requester: bool,
    pub counterpart: ProfileSummary,
}

/// All connections of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsListResponse {
    pub connections: Vec<ConnectionView>,
}

/// Optional filter for the connection listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionsQuery {
    #[serde(default)]
    pub status: Option<ConnectionStatus>,
}

/// An accepted connection with its most recent activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub connection_id: i64,
    pub counterpart: ProfileSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_preview: Option<String>,
    pub unread_count: i64,
    pub last_activity_at: String,
}

/// Conversations of the authenticated user, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationsListResponse {
    pub conversations: Vec<ConversationSummary>,
}
