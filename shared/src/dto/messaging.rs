//! # Messaging Data Transfer Objects
//!
//! Defines request and response structures for direct messaging, attachments and
//! the realtime relay.
//!
//! Every message written by a client carries a `client_id` (a UUID generated before
//! the write). The server stores it and echoes it back, both in the write response
//! and in the relay event, so clients can match the confirmed record with their
//! tentative copy.

use serde::{Deserialize, Serialize};

use super::connections::ConnectionDto;

/// Largest accepted attachment (5 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Largest accepted message body, in bytes.
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Uploaded file referenced by a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    pub mime_type: String,
}

/// Message for direct messaging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageDto {
    pub id: i64,
    pub connection_id: i64,
    pub sender_id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    pub created_at: String,
    #[serde(default)]
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Body of `POST /api/connections/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

/// Messages of one conversation, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesListResponse {
    pub messages: Vec<MessageDto>,
}

/// Query of `POST /api/connections/{id}/attachments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentUploadQuery {
    pub name: String,
}

/// Result of marking a conversation as read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// Event pushed by the notification relay.
///
/// Serialized with a `type` tag:
///
/// ```text
/// {"type":"message_created","message":{"id":4,"connection_id":2,...}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    ConnectionRequested { connection: ConnectionDto },
    ConnectionUpdated { connection: ConnectionDto },
    MessageCreated { message: MessageDto },
}

impl RelayEvent {
    /// Event name used for the SSE `event:` field.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayEvent::ConnectionRequested { .. } => "connection_requested",
            RelayEvent::ConnectionUpdated { .. } => "connection_updated",
            RelayEvent::MessageCreated { .. } => "message_created",
        }
    }

    /// Connection the event belongs to.
    pub fn connection_id(&self) -> i64 {
        match self {
            RelayEvent::ConnectionRequested { connection }
            | RelayEvent::ConnectionUpdated { connection } => connection.id,
            RelayEvent::MessageCreated { message } => message.connection_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_event_is_tagged() {
        let event = RelayEvent::MessageCreated {
            message: MessageDto {
                id: 4,
                connection_id: 2,
                sender_id: 1,
                content: "hi".to_string(),
                attachment: None,
                created_at: "2025-01-01T00:00:00Z".to_string(),
                read: false,
                client_id: None,
            },
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "message_created");
        assert_eq!(value["message"]["content"], "hi");
        assert!(value["message"].get("attachment").is_none());
        assert_eq!(event.kind(), "message_created");
        assert_eq!(event.connection_id(), 2);
    }
}
