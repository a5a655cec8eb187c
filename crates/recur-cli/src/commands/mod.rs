//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `detect` - Detection, normalization and config commands, plus shared loaders
//! - `serve` - Web server command

pub mod detect;
pub mod serve;

// Re-export command functions for main.rs
pub use detect::*;
pub use serve::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
