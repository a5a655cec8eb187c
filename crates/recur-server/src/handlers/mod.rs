//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod detection;
pub mod health;

// Re-export all handlers for use in router
pub use detection::*;
pub use health::*;
