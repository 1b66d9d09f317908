//! # Chat Session
//!
//! Drives one conversation for one user: loads the history, performs optimistic
//! writes and merges relay events into the [`ConversationLog`].
//!
//! Writes are two-phase. [`ChatSession::begin_text`] adds the tentative entry and
//! returns [`WriteOutcome::Tentative`]; [`ChatSession::complete`] performs the durable
//! write and returns `Confirmed` or `Failed`. [`ChatSession::send_text`] does both.

use crate::client::ApiClient;
use crate::conversation::{Applied, ConversationLog, WriteOutcome};
use crate::error::{ClientError, Result};
use crate::subscription::StreamItem;
use async_trait::async_trait;
use shared::dto::{Attachment, MessageDto, RelayEvent, SendMessageRequest, MAX_ATTACHMENT_BYTES, MAX_MESSAGE_LENGTH};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Calls a [`ChatSession`] makes against the backend.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn list_messages(&self, connection_id: i64) -> Result<Vec<MessageDto>>;

    async fn send_message(&self, connection_id: i64, request: &SendMessageRequest) -> Result<MessageDto>;

    async fn upload_attachment(
        &self,
        connection_id: i64,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Attachment>;
}

#[async_trait]
impl MessageTransport for ApiClient {
    async fn list_messages(&self, connection_id: i64) -> Result<Vec<MessageDto>> {
        ApiClient::list_messages(self, connection_id).await
    }

    async fn send_message(&self, connection_id: i64, request: &SendMessageRequest) -> Result<MessageDto> {
        ApiClient::send_message(self, connection_id, request).await
    }

    async fn upload_attachment(
        &self,
        connection_id: i64,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Attachment> {
        ApiClient::upload_attachment(self, connection_id, name, mime_type, bytes).await
    }
}

pub struct ChatSession<T: MessageTransport> {
    transport: Arc<T>,
    user_id: i64,
    log: ConversationLog,
    pending: HashMap<String, SendMessageRequest>,
}

impl<T: MessageTransport> ChatSession<T> {
    /// Open a conversation and load its history.
    ///
    /// Gate failures (`NotFound`, `Forbidden`, `NotAccepted`) come back as
    /// [`ClientError::Api`]; check [`ClientError::is_gate_failure`].
    pub async fn open(transport: Arc<T>, connection_id: i64, user_id: i64) -> Result<Self> {
        let mut session = Self {
            transport,
            user_id,
            log: ConversationLog::new(connection_id),
            pending: HashMap::new(),
        };
        session.refresh().await?;
        Ok(session)
    }

    pub fn connection_id(&self) -> i64 {
        self.log.connection_id()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Refetch the full history. Recovery path after a `resync` or a reconnect.
    pub async fn refresh(&mut self) -> Result<()> {
        let messages = self.transport.list_messages(self.connection_id()).await?;
        debug!("Loaded {} messages for connection {}", messages.len(), self.connection_id());
        self.log.replace_all(messages);
        Ok(())
    }

    /// First phase of a text write.
    pub fn begin_text(&mut self, content: &str) -> Result<WriteOutcome> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::InvalidInput("Message cannot be empty".to_string()));
        }
        if content.len() > MAX_MESSAGE_LENGTH {
            return Err(ClientError::InvalidInput(format!(
                "Message must be at most {} bytes",
                MAX_MESSAGE_LENGTH
            )));
        }
        let client_id = self.begin(content.to_string(), None);
        Ok(WriteOutcome::Tentative { client_id })
    }

    /// Second phase: the durable write for a tentative entry.
    pub async fn complete(&mut self, client_id: &str) -> WriteOutcome {
        let Some(request) = self.pending.remove(client_id) else {
            warn!("No pending write with client id {}", client_id);
            return WriteOutcome::Failed {
                client_id: client_id.to_string(),
                content: String::new(),
                attachment: None,
                error: ClientError::InvalidInput("Unknown write".to_string()),
            };
        };

        match self.transport.send_message(self.connection_id(), &request).await {
            Ok(message) => {
                self.log.apply(message.clone());
                WriteOutcome::Confirmed(message)
            }
            Err(error) => {
                warn!("Write {} failed: {}", client_id, error);
                self.log.fail(client_id);
                WriteOutcome::Failed {
                    client_id: client_id.to_string(),
                    content: request.content,
                    attachment: request.attachment,
                    error,
                }
            }
        }
    }

    pub async fn send_text(&mut self, content: &str) -> Result<WriteOutcome> {
        match self.begin_text(content)? {
            WriteOutcome::Tentative { client_id } => Ok(self.complete(&client_id).await),
            outcome => Ok(outcome),
        }
    }

    /// Upload a file and send it with an optional caption.
    ///
    /// Files over the size limit are rejected before any network call.
    pub async fn send_attachment(
        &mut self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<WriteOutcome> {
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(ClientError::AttachmentTooLarge {
                size: bytes.len(),
                limit: MAX_ATTACHMENT_BYTES,
            });
        }
        if bytes.is_empty() {
            return Err(ClientError::InvalidInput("Attachment is empty".to_string()));
        }

        let attachment = self
            .transport
            .upload_attachment(self.connection_id(), name, mime_type, bytes)
            .await?;
        info!("Uploaded {} to connection {}", attachment.name, self.connection_id());

        let client_id = self.begin(caption.trim().to_string(), Some(attachment));
        Ok(self.complete(&client_id).await)
    }

    /// Merge a relay event. Returns true when the visible log changed.
    pub fn apply_event(&mut self, event: RelayEvent) -> bool {
        match event {
            RelayEvent::MessageCreated { message } => {
                matches!(self.log.apply(message), Applied::Added | Applied::ReplacedTentative)
            }
            _ => false,
        }
    }

    /// Handle one item of a conversation stream, refetching on `resync`.
    pub async fn handle_stream_item(&mut self, item: StreamItem) -> Result<bool> {
        match item {
            StreamItem::Event(event) => Ok(self.apply_event(event)),
            StreamItem::Resync => {
                info!("Relay asked for resync on connection {}", self.connection_id());
                self.refresh().await?;
                Ok(true)
            }
        }
    }

    fn begin(&mut self, content: String, attachment: Option<Attachment>) -> String {
        let tentative = self.log.begin(self.user_id, content, attachment);
        self.pending.insert(tentative.client_id.clone(), tentative.to_request());
        tentative.client_id
    }
}
