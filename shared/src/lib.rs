//! # Shared Data Transfer Objects Library
//!
//! This library defines the contract between the API server and its clients.
//! All DTOs use JSON serialization via `serde` for API communication.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects for API communication
//!   - **[`dto::auth`]**: Signup, login and token responses
//!   - **[`dto::profiles`]**: Profiles and public profile summaries
//!   - **[`dto::connections`]**: Connection requests and their lifecycle status
//!   - **[`dto::messaging`]**: Messages, attachments and relay events
//!   - **[`dto::mentors`]**: Mentor search and recommendations
//! - **[`utils`]**: Shared display helpers
//!
//! ## Wire Format
//!
//! All DTOs serialize to JSON using the default `serde` behavior:
//! - Field names use **snake_case** in Rust and in JSON
//! - Optional fields are omitted from JSON when `None`
//! - Enums serialize to lowercase strings
//!
//! ## Usage in a Client
//!
//! ```rust,ignore
//! use shared::dto::connections::{ConnectionView, CreateConnectionRequest};
//!
//! # async fn example() -> Result<(), reqwest::Error> {
//! let request = CreateConnectionRequest { receiver_id: 7 };
//! let created: ConnectionView = reqwest::Client::new()
//!     .post("http://localhost:3001/api/connections")
//!     .bearer_auth("token")
//!     .json(&request)
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod dto;
pub mod utils;

pub use dto::*;
pub use utils::*;
