//! Detection configuration
//!
//! Every threshold and scoring weight used by detection lives here so it can
//! be tuned without touching the algorithm.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path (e.g. `recur --config thresholds.toml`)
//! 2. Override in data dir (~/.local/share/recur/config/detection.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Keys missing from a file keep their default values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/detection.toml");

/// Thresholds and weights for recurring charge detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum merchant pattern length (characters) to group on
    pub min_pattern_len: usize,
    /// Minimum charges in a group
    pub min_transactions: usize,
    /// Maximum coefficient of variation of charge amounts
    pub max_amount_variance: f64,
    /// Maximum average gap between charges, in days
    pub max_average_interval_days: f64,
    /// Minimum confidence (0-100) to report a candidate
    pub min_confidence: u32,

    // Confidence weights
    pub repetition_points_per_transaction: f64,
    pub repetition_max_points: f64,
    pub amount_stability_points: f64,
    /// Points lost per unit of amount variance
    pub amount_variance_penalty: f64,
    pub interval_consistency_points: f64,

    /// Number of recent charges attached to each candidate
    pub sample_size: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_pattern_len: 3,
            min_transactions: 2,
            max_amount_variance: 0.10,
            max_average_interval_days: 400.0,
            min_confidence: 40,
            repetition_points_per_transaction: 10.0,
            repetition_max_points: 40.0,
            amount_stability_points: 30.0,
            amount_variance_penalty: 100.0,
            interval_consistency_points: 30.0,
            sample_size: 5,
        }
    }
}

impl DetectionConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML (for `recur config`)
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject values that would make detection meaningless
    pub fn validate(&self) -> Result<()> {
        if self.min_transactions < 2 {
            return Err(Error::Config(format!(
                "min_transactions must be at least 2 (got {})",
                self.min_transactions
            )));
        }
        if self.min_confidence > 100 {
            return Err(Error::Config(format!(
                "min_confidence must be between 0 and 100 (got {})",
                self.min_confidence
            )));
        }
        if self.sample_size == 0 {
            return Err(Error::Config("sample_size must be at least 1".to_string()));
        }

        let non_negative = [
            ("max_amount_variance", self.max_amount_variance),
            ("max_average_interval_days", self.max_average_interval_days),
            (
                "repetition_points_per_transaction",
                self.repetition_points_per_transaction,
            ),
            ("repetition_max_points", self.repetition_max_points),
            ("amount_stability_points", self.amount_stability_points),
            ("amount_variance_penalty", self.amount_variance_penalty),
            ("interval_consistency_points", self.interval_consistency_points),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number (got {})",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("recur").join("config").join("detection.toml"))
}

/// Load configuration (explicit path, then override location, then embedded default)
pub fn load_config(explicit_path: Option<&Path>) -> Result<DetectionConfig> {
    if let Some(path) = explicit_path {
        debug!("Loading detection config from {}", path.display());
        let content = fs::read_to_string(path)?;
        return DetectionConfig::from_toml_str(&content);
    }

    if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            debug!("Loading detection config from {}", default_path.display());
            let content = fs::read_to_string(&default_path)?;
            return DetectionConfig::from_toml_str(&content);
        }
    }

    debug!("Using embedded default detection config");
    DetectionConfig::from_toml_str(DEFAULT_CONFIG)
}
