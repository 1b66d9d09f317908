//! # Conversation Log
//!
//! Local copy of one conversation: authoritative messages keyed by server id plus
//! the tentative messages this client has written but not yet seen confirmed.
//!
//! Confirmed write responses and relay events go through the same [`ConversationLog::apply`]:
//!
//! 1. a message whose id is already present is ignored;
//! 2. a message whose `client_id` matches a tentative entry replaces that entry;
//! 3. anything else is added.
//!
//! Display order is confirmed messages by id, then tentative ones in the order they
//! were written.

use crate::error::ClientError;
use chrono::Utc;
use shared::dto::{Attachment, MessageDto, SendMessageRequest};
use std::collections::BTreeMap;
use uuid::Uuid;

/// State of a single write.
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    /// Shown locally, the server has not answered yet.
    Tentative { client_id: String },
    /// Stored by the server.
    Confirmed(MessageDto),
    /// Removed from the log. The content is handed back so it can be resubmitted.
    Failed {
        client_id: String,
        content: String,
        attachment: Option<Attachment>,
        error: ClientError,
    },
}

impl WriteOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, WriteOutcome::Confirmed(_))
    }
}

/// A local write waiting for the server.
#[derive(Debug, Clone, PartialEq)]
pub struct TentativeMessage {
    pub client_id: String,
    pub sender_id: i64,
    pub content: String,
    pub attachment: Option<Attachment>,
    pub created_at: String,
}

impl TentativeMessage {
    /// Request body for the durable write.
    pub fn to_request(&self) -> SendMessageRequest {
        SendMessageRequest {
            client_id: Some(self.client_id.clone()),
            content: self.content.clone(),
            attachment: self.attachment.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry<'a> {
    Confirmed(&'a MessageDto),
    Tentative(&'a TentativeMessage),
}

impl<'a> Entry<'a> {
    pub fn content(&self) -> &'a str {
        match self {
            Entry::Confirmed(message) => &message.content,
            Entry::Tentative(message) => &message.content,
        }
    }

    pub fn sender_id(&self) -> i64 {
        match self {
            Entry::Confirmed(message) => message.sender_id,
            Entry::Tentative(message) => message.sender_id,
        }
    }

    pub fn is_tentative(&self) -> bool {
        matches!(self, Entry::Tentative(_))
    }
}

/// What [`ConversationLog::apply`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Added,
    ReplacedTentative,
    Duplicate,
    OtherConversation,
}

#[derive(Debug, Clone)]
pub struct ConversationLog {
    connection_id: i64,
    confirmed: BTreeMap<i64, MessageDto>,
    tentative: Vec<TentativeMessage>,
}

impl ConversationLog {
    pub fn new(connection_id: i64) -> Self {
        Self {
            connection_id,
            confirmed: BTreeMap::new(),
            tentative: Vec::new(),
        }
    }

    pub fn connection_id(&self) -> i64 {
        self.connection_id
    }

    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.confirmed
            .values()
            .map(Entry::Confirmed)
            .chain(self.tentative.iter().map(Entry::Tentative))
    }

    pub fn len(&self) -> usize {
        self.confirmed.len() + self.tentative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &MessageDto> {
        self.confirmed.values()
    }

    pub fn tentative(&self) -> &[TentativeMessage] {
        &self.tentative
    }

    pub fn last_id(&self) -> Option<i64> {
        self.confirmed.keys().next_back().copied()
    }

    /// Add a tentative entry with a fresh `client_id`.
    pub fn begin(&mut self, sender_id: i64, content: String, attachment: Option<Attachment>) -> TentativeMessage {
        let message = TentativeMessage {
            client_id: Uuid::new_v4().to_string(),
            sender_id,
            content,
            attachment,
            created_at: Utc::now().to_rfc3339(),
        };
        self.tentative.push(message.clone());
        message
    }

    /// Merge an authoritative message.
    pub fn apply(&mut self, message: MessageDto) -> Applied {
        if message.connection_id != self.connection_id {
            return Applied::OtherConversation;
        }
        if self.confirmed.contains_key(&message.id) {
            return Applied::Duplicate;
        }

        let replaced = match message.client_id.as_deref() {
            Some(client_id) => self.remove_tentative(client_id).is_some(),
            None => false,
        };
        self.confirmed.insert(message.id, message);

        if replaced {
            Applied::ReplacedTentative
        } else {
            Applied::Added
        }
    }

    /// Drop a tentative entry whose write failed and return it.
    pub fn fail(&mut self, client_id: &str) -> Option<TentativeMessage> {
        self.remove_tentative(client_id)
    }

    /// Replace the confirmed history with a fresh server listing.
    ///
    /// Tentative entries survive unless the listing already contains their write.
    pub fn replace_all(&mut self, messages: Vec<MessageDto>) {
        self.confirmed.clear();
        for message in messages {
            if message.connection_id == self.connection_id {
                if let Some(client_id) = message.client_id.as_deref() {
                    self.remove_tentative(client_id);
                }
                self.confirmed.insert(message.id, message);
            }
        }
    }

    fn remove_tentative(&mut self, client_id: &str) -> Option<TentativeMessage> {
        let index = self.tentative.iter().position(|m| m.client_id == client_id)?;
        Some(self.tentative.remove(index))
    }
}
