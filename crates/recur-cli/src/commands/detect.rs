//! Detection command implementations and shared loaders
//!
//! This module contains:
//! - `load_detection_config` - Shared utility to resolve detection thresholds
//! - `run_detection` - Load input files and run the detector
//! - `cmd_detect` - Print detection results
//! - `cmd_normalize` - Show merchant patterns for descriptions
//! - `cmd_config` - Print the effective configuration

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use recur_core::normalize::is_groupable;
use recur_core::{
    display_name, load_config, load_existing_patterns, load_transactions, normalize_merchant,
    DetectionConfig, DetectionReport, ExistingPatterns, SubscriptionDetector,
};

use super::truncate;

/// Resolve detection thresholds (--config, then user override, then defaults)
pub fn load_detection_config(path: Option<&Path>) -> Result<DetectionConfig> {
    match path {
        Some(p) => load_config(Some(p))
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => load_config(None).context("Failed to load detection config"),
    }
}

/// Parse --today, defaulting to the current UTC date
pub fn parse_today(today: Option<&str>) -> Result<NaiveDate> {
    today
        .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
        .transpose()
        .context("Invalid --today format (use YYYY-MM-DD)")
        .map(|d| d.unwrap_or_else(|| Utc::now().date_naive()))
}

/// Load the input files and run detection
pub fn run_detection(
    transactions_path: &Path,
    existing_path: Option<&Path>,
    today: NaiveDate,
    config: &DetectionConfig,
) -> Result<DetectionReport> {
    let transactions = load_transactions(transactions_path).with_context(|| {
        format!(
            "Failed to load transactions from {}",
            transactions_path.display()
        )
    })?;

    let existing = match existing_path {
        Some(path) => load_existing_patterns(path)
            .with_context(|| format!("Failed to load patterns from {}", path.display()))?,
        None => ExistingPatterns::new(),
    };

    let detector = SubscriptionDetector::with_config(config.clone());
    Ok(detector.detect(&transactions, &existing, today))
}

pub fn cmd_detect(
    transactions_path: &Path,
    existing_path: Option<&Path>,
    today: Option<&str>,
    config: &DetectionConfig,
    json: bool,
) -> Result<()> {
    let today = parse_today(today)?;
    let report = run_detection(transactions_path, existing_path, today, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🔍 Analyzed {} transactions", report.analyzed_transactions);

    if report.detected.is_empty() {
        println!();
        println!("✅ No recurring charges found.");
        return Ok(());
    }

    println!();
    println!("📋 Recurring Charges (as of {})", today);
    println!("   ─────────────────────────────────────────────────────────────────");

    for sub in &report.detected {
        println!(
            "   {:24} │ {:>9}/{:<9} │ next {} │ {:>3}% ({} charges)",
            truncate(&sub.name, 24),
            format!("${:.2}", sub.amount.abs()),
            sub.frequency.as_str(),
            sub.next_renewal_date,
            sub.confidence,
            sub.transaction_count
        );
    }

    println!();
    println!(
        "💰 {} candidates, about ${:.2}/month",
        report.detected.len(),
        report.estimated_monthly_total()
    );

    Ok(())
}

pub fn cmd_normalize(descriptions: &[String], config: &DetectionConfig) -> Result<()> {
    for description in descriptions {
        let pattern = normalize_merchant(description);
        if is_groupable(&pattern, config.min_pattern_len) {
            println!("   {:32} → {} ({})", description, pattern, display_name(&pattern));
        } else {
            println!(
                "   {:32} → {:?} (too short to group, min {})",
                description, pattern, config.min_pattern_len
            );
        }
    }
    Ok(())
}

pub fn cmd_config(config: &DetectionConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
