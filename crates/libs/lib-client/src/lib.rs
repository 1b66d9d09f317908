//! # IntelliConnect Client Library
//!
//! Everything a front end needs to talk to the backend:
//!
//! - [`client`] - typed HTTP calls ([`ApiClient`])
//! - [`subscription`] - relay event streams over SSE
//! - [`conversation`] - local conversation log with tentative writes
//! - [`session`] - one open conversation: history, optimistic sends, relay merging
//!
//! ```rust,ignore
//! use lib_client::{ApiClient, ChatSession, WriteOutcome};
//! use std::sync::Arc;
//!
//! let mut api = ApiClient::default();
//! let auth = api.login("ada@uni.edu", "Secret123!").await?;
//! let api = Arc::new(api);
//!
//! let mut session = ChatSession::open(api.clone(), 12, auth.user.id).await?;
//! let mut events = api.subscribe_connection(12).await?;
//!
//! if let WriteOutcome::Failed { content, .. } = session.send_text("hello").await? {
//!     // put `content` back in the input box
//! }
//! while let Some(item) = events.next().await {
//!     session.handle_stream_item(item).await?;
//! }
//! ```

pub mod client;
pub mod conversation;
pub mod error;
pub mod session;
pub mod subscription;

pub use client::ApiClient;
pub use conversation::{ConversationLog, Entry, WriteOutcome};
pub use error::{ClientError, Result};
pub use session::{ChatSession, MessageTransport};
pub use subscription::{StreamItem, Subscription};
