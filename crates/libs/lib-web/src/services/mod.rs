//! # Services Layer
//!
//! Business logic and integrations that sit behind the HTTP handlers:
//!
//! ```text
//! Handlers (HTTP) → Services → Repository / Object store / LLM endpoint
//! ```
//!
//! ## Module Organization
//!
//! - [`object_store`] - Attachment storage behind the [`ObjectStore`](object_store::ObjectStore) trait
//! - [`llm`] - OpenAI-compatible `chat/completions` client
//! - [`mentor_search`] - Mentor search (AI ranking with text fallback) and recommendations
//!
//! All services return `Result<T, AppError>` or a service-local error that handlers
//! convert into the matching `AppError` variant.

pub mod llm;
pub mod mentor_search;
pub mod object_store;

pub use llm::LlmClient;
pub use mentor_search::MentorSearchService;
pub use object_store::{LocalObjectStore, ObjectStore, ObjectStoreError};
