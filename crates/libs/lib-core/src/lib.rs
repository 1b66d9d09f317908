//! # Core Library
//!
//! Configuration, the application error type, the SQLite store and the domain rules
//! (connection lifecycle and chat access gate).

pub mod config;
pub mod dto;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use model::store::{create_memory_pool, create_pool, run_migrations, DbPool};
