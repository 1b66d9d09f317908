//! # Shared Utility Functions
//!
//! Small display helpers.
//!
//! ```rust
//! use shared::utils::preview;
//!
//! assert_eq!(preview("hello world", 5), "hello...");
//! ```

/// First `max_chars` characters of `text`, with an ellipsis when truncated.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
