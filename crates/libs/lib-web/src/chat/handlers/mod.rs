//! # Chat Handlers
//!
//! HTTP handlers for chat functionality.

// region: --- Modules
pub mod attachments;
pub mod messages;
pub mod subscription;

// endregion: --- Modules

// region: --- Re-exports
pub use attachments::upload_attachment;
pub use messages::{list_messages, mark_read, send_message};
pub use subscription::{connection_stream, notification_stream};
// endregion: --- Re-exports
