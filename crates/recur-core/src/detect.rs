//! Recurring charge detection
//!
//! Finds subscription candidates in a transaction history:
//! 1. Expenses are grouped by normalized merchant pattern
//! 2. Each group is gated on repetition, amount stability and sparsity
//! 3. Surviving groups are classified by billing frequency and scored
//!
//! Detection is a pure function of its inputs. Fetching transactions and
//! persisting confirmed subscriptions is up to the caller.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::DetectionConfig;
use crate::models::{DetectedSubscription, DetectionReport, ExistingPatterns, Frequency, Transaction};
use crate::normalize::{display_name, is_groupable, normalize_merchant};

/// Expense transactions sharing one merchant pattern
#[derive(Debug)]
struct TransactionGroup<'a> {
    pattern: String,
    transactions: Vec<&'a Transaction>,
    /// Signed amounts, in the same order as `transactions`
    amounts: Vec<f64>,
}

/// Scores a group of charges for recurrence
pub struct SubscriptionDetector {
    config: DetectionConfig,
}

impl SubscriptionDetector {
    pub fn new() -> Self {
        Self {
            config: DetectionConfig::default(),
        }
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect recurring charges as of `today`
    ///
    /// `existing` holds merchant patterns already tracked as subscriptions;
    /// matching groups are never reported again.
    pub fn detect(
        &self,
        transactions: &[Transaction],
        existing: &ExistingPatterns,
        today: NaiveDate,
    ) -> DetectionReport {
        let groups = self.group_transactions(transactions, existing);
        let group_count = groups.len();

        let mut detected: Vec<DetectedSubscription> = groups
            .iter()
            .filter_map(|group| self.evaluate_group(group, today))
            .collect();

        // Stable sort keeps first-seen order between equal scores
        detected.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        info!(
            "Detection complete: {} candidates from {} transactions ({} merchant groups)",
            detected.len(),
            transactions.len(),
            group_count
        );

        DetectionReport {
            detected,
            analyzed_transactions: transactions.len(),
        }
    }

    /// Bucket expenses by merchant pattern, in first-seen order
    fn group_transactions<'a>(
        &self,
        transactions: &'a [Transaction],
        existing: &ExistingPatterns,
    ) -> Vec<TransactionGroup<'a>> {
        let mut groups: Vec<TransactionGroup<'a>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for tx in transactions {
            if !tx.is_expense() {
                continue; // Skip income/credits
            }

            let pattern = normalize_merchant(&tx.description);
            if !is_groupable(&pattern, self.config.min_pattern_len) {
                debug!(
                    "Skipping transaction {} - pattern {:?} too short",
                    tx.id, pattern
                );
                continue;
            }
            if existing.contains(&pattern) {
                debug!(
                    "Skipping transaction {} - {} already tracked",
                    tx.id, pattern
                );
                continue;
            }

            let slot = match index.get(&pattern) {
                Some(&slot) => slot,
                None => {
                    groups.push(TransactionGroup {
                        pattern: pattern.clone(),
                        transactions: Vec::new(),
                        amounts: Vec::new(),
                    });
                    index.insert(pattern, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[slot].transactions.push(tx);
            groups[slot].amounts.push(tx.amount);
        }

        groups
    }

    /// Apply the gates and scoring to one group
    fn evaluate_group(
        &self,
        group: &TransactionGroup<'_>,
        today: NaiveDate,
    ) -> Option<DetectedSubscription> {
        let count = group.transactions.len();
        if count < self.config.min_transactions {
            return None; // Need repetition to call it recurring
        }

        let magnitudes: Vec<f64> = group.amounts.iter().map(|a| a.abs()).collect();
        let variance = amount_variance(&magnitudes);
        if variance > self.config.max_amount_variance {
            debug!(
                "Skipping {} - amount variance {:.3} above {:.3}",
                group.pattern, variance, self.config.max_amount_variance
            );
            return None;
        }

        let mut dates: Vec<NaiveDate> = group.transactions.iter().map(|t| t.date).collect();
        dates.sort();

        let avg_interval = average_interval(&dates);
        if avg_interval > self.config.max_average_interval_days {
            debug!(
                "Skipping {} - average interval {:.1} days too sparse",
                group.pattern, avg_interval
            );
            return None;
        }

        let frequency = Frequency::from_average_interval(avg_interval);
        let consistency = interval_consistency(&dates, frequency);
        let confidence = self.confidence_score(count, variance, consistency);
        if confidence < self.config.min_confidence {
            debug!(
                "Skipping {} - confidence {} below {}",
                group.pattern, confidence, self.config.min_confidence
            );
            return None;
        }

        let last_charge_date = *dates.last()?;
        let Some(next_renewal_date) = next_renewal_date(last_charge_date, frequency, today) else {
            warn!(
                "Skipping {} - renewal date after {} is out of calendar range",
                group.pattern, last_charge_date
            );
            return None;
        };

        let mut recent = group.transactions.clone();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        let sample_transactions = recent
            .into_iter()
            .take(self.config.sample_size)
            .cloned()
            .collect();

        let average = group.amounts.iter().sum::<f64>() / count as f64;

        debug!(
            "Found subscription: {} @ ${:.2}/{} (confidence {})",
            group.pattern,
            average.abs(),
            frequency,
            confidence
        );

        Some(DetectedSubscription {
            name: display_name(&group.pattern),
            merchant_pattern: group.pattern.clone(),
            amount: round_to_cents(average),
            frequency,
            next_renewal_date,
            last_charge_date,
            confidence,
            transaction_count: count,
            sample_transactions,
        })
    }

    /// Combine repetition, amount stability and timing regularity into 0-100
    fn confidence_score(&self, count: usize, variance: f64, consistency: f64) -> u32 {
        let cfg = &self.config;
        let repetition =
            (count as f64 * cfg.repetition_points_per_transaction).min(cfg.repetition_max_points);
        let stability =
            (cfg.amount_stability_points - variance * cfg.amount_variance_penalty).max(0.0);
        let regularity = consistency * cfg.interval_consistency_points;

        (repetition + stability + regularity).round().clamp(0.0, 100.0) as u32
    }
}

impl Default for SubscriptionDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Coefficient of variation (population standard deviation over mean).
///
/// Returns 1.0 for an empty slice or a zero mean so the group fails the
/// variance gate.
pub fn amount_variance(amounts: &[f64]) -> f64 {
    if amounts.is_empty() {
        return 1.0;
    }

    let n = amounts.len() as f64;
    let mean = amounts.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 1.0;
    }

    let squared = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
    squared.sqrt() / mean
}

/// Mean gap in days between consecutive ascending dates (0 with fewer than two)
pub fn average_interval(sorted_dates: &[NaiveDate]) -> f64 {
    let gaps = gaps_in_days(sorted_dates);
    if gaps.is_empty() {
        return 0.0;
    }
    gaps.iter().sum::<f64>() / gaps.len() as f64
}

/// How closely the gaps match the frequency's nominal interval (0..=1)
pub fn interval_consistency(sorted_dates: &[NaiveDate], frequency: Frequency) -> f64 {
    let gaps = gaps_in_days(sorted_dates);
    if gaps.is_empty() {
        return 0.0;
    }

    let expected = frequency.expected_interval_days();
    let mean_deviation =
        gaps.iter().map(|g| (g - expected).abs() / expected).sum::<f64>() / gaps.len() as f64;

    (1.0 - mean_deviation).max(0.0)
}

fn gaps_in_days(sorted_dates: &[NaiveDate]) -> Vec<f64> {
    sorted_dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days() as f64)
        .collect()
}

/// First charge date strictly after `today`, stepping whole billing periods
/// from the last charge (missed charges are skipped, not just one period added).
///
/// The step count is estimated from the elapsed calendar span, so at most a
/// couple of candidates are checked however far behind the last charge is.
pub fn next_renewal_date(
    last_charge: NaiveDate,
    frequency: Frequency,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let mut steps = frequency.periods_between(last_charge, today).max(1);
    loop {
        let candidate = frequency.advance(last_charge, steps)?;
        if candidate > today {
            return Some(candidate);
        }
        steps = steps.checked_add(1)?;
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
