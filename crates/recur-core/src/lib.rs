//! Recur Core Library
//!
//! Shared functionality for the Recur recurring charge detector:
//! - Merchant name normalization
//! - Recurring charge detection and confidence scoring
//! - Detection thresholds with TOML overrides
//! - Loading transactions and tracked patterns from files

pub mod config;
pub mod detect;
pub mod error;
pub mod import;
pub mod models;
pub mod normalize;

/// Test utilities for building transaction fixtures
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{load_config, DetectionConfig};
pub use detect::SubscriptionDetector;
pub use error::{Error, Result};
pub use import::{load_existing_patterns, load_transactions};
pub use models::{
    DetectedSubscription, DetectionReport, ExistingPatterns, ExistingSubscriptionPattern,
    Frequency, Transaction,
};
pub use normalize::{display_name, normalize_merchant};
