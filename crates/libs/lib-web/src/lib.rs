//! # Web Library
//!
//! HTTP handlers, middleware, the chat relay and web services.

pub mod chat;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;

#[cfg(test)]
mod test_support;

pub use server::{create_router, init_tracing, start_server, AppState, ServerConfig};
