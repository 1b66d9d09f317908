//! # Data Transfer Objects (DTOs)
//!
//! Wire types live in the `shared` crate so the client library can use them too.
//! They are re-exported here so server code only imports from `lib_core`.

pub use shared::dto::*;
