//! # Chat Module
//!
//! Direct messaging between the two participants of an accepted connection.
//!
//! - [`db`]: append-only message log in SQLite
//! - [`relay`]: in-process fan-out of realtime events
//! - [`handlers`]: HTTP endpoints for messages, attachments and SSE streams
//!
//! Every chat endpoint runs the access gate
//! ([`authorize_chat`](lib_core::model::access::authorize_chat)) on each request.
//! Writes go to the store first; the stored record is then pushed through the relay.

pub mod db;
pub mod handlers;
pub mod relay;

pub use relay::{Delivery, Relay};
