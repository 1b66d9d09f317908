//! # Data Transfer Objects (DTOs)
//!
//! This module contains all data structures exchanged between the API server
//! and its clients.
//!
//! ## Module Organization
//!
//! - [`auth`] - Signup, login and token responses
//! - [`profiles`] - Profiles, roles and public summaries
//! - [`connections`] - Connection requests, status lifecycle and conversation summaries
//! - [`messaging`] - Messages, attachments and realtime relay events
//! - [`mentors`] - Mentor search and recommendation payloads
//!
//! ## Serialization Format
//!
//! - **Field naming**: snake_case (default serde behavior)
//! - **Optional fields**: Omitted when `None` using `#[serde(skip_serializing_if = "Option::is_none")]`
//! - **Enums**: Serialize to lowercase strings using `#[serde(rename_all = "lowercase")]`
//!
//! ## Example JSON Communication
//!
//! ```text
//! POST /api/connections/12/status
//! Content-Type: application/json
//!
//! { "status": "accepted" }
//! ```
//!
//! ```text
//! HTTP/1.1 200 OK
//! Content-Type: application/json
//!
//! {
//!   "id": 12,
//!   "requester_id": 3,
//!   "receiver_id": 5,
//!   "status": "accepted",
//!   "created_at": "2025-01-01T00:00:00Z",
//!   "is_requester": false,
//!   "counterpart": { "id": 3, "full_name": "Ada Lovelace", "institution": "UCL", "role": "student" }
//! }
//! ```

pub mod auth;
pub mod connections;
pub mod mentors;
pub mod messaging;
pub mod profiles;

pub use auth::*;
pub use connections::*;
pub use mentors::*;
pub use messaging::*;
pub use profiles::*;
