//! # Model Layer
//!
//! - [`store`]: SQLite pool, migrations and repositories
//! - [`lifecycle`]: connection status transitions
//! - [`access`]: the chat access gate

pub mod access;
pub mod lifecycle;
pub mod store;
