//! # Utilities Library
//!
//! Shared helpers for environment variables, timestamps, and input validation.

pub mod envs;
pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use envs::{get_env, get_env_list, get_env_or, get_env_parse_or};
pub use time::{format_time, timestamp_millis};
pub use validation::{normalize_tags, validate_email, validate_max_length, validate_min_length, validate_not_empty};
