//! Data models for Recur

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// A bank transaction supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    /// Negative = expense, positive = income
    pub amount: f64,
    /// Raw merchant text as it appears on the statement
    pub description: String,
    pub account_id: String,
}

impl Transaction {
    /// Whether this transaction is money going out
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

/// A merchant pattern the caller already tracks as a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingSubscriptionPattern {
    pub merchant_pattern: String,
}

/// Case-insensitive set of merchant patterns excluded from detection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingPatterns {
    patterns: HashSet<String>,
}

impl ExistingPatterns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns(patterns: &[ExistingSubscriptionPattern]) -> Self {
        patterns.iter().map(|p| p.merchant_pattern.as_str()).collect()
    }

    pub fn insert(&mut self, pattern: &str) {
        self.patterns.insert(pattern.trim().to_lowercase());
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains(&pattern.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExistingPatterns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for pattern in iter {
            set.insert(pattern.as_ref());
        }
        set
    }
}

/// Subscription billing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

/// How a frequency moves along the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalendarStep {
    Days(u64),
    Months(u32),
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Classify an average gap between charges (inclusive upper bounds)
    pub fn from_average_interval(days: f64) -> Self {
        if days <= 2.0 {
            Self::Daily
        } else if days <= 10.0 {
            Self::Weekly
        } else if days <= 21.0 {
            Self::Biweekly
        } else if days <= 45.0 {
            Self::Monthly
        } else if days <= 120.0 {
            Self::Quarterly
        } else {
            Self::Yearly
        }
    }

    /// Nominal number of days between two charges
    pub fn expected_interval_days(&self) -> f64 {
        match self {
            Self::Daily => 1.0,
            Self::Weekly => 7.0,
            Self::Biweekly => 14.0,
            Self::Monthly => 30.0,
            Self::Quarterly => 91.0,
            Self::Yearly => 365.0,
        }
    }

    /// How many charges of this frequency fall in an average month
    pub fn charges_per_month(&self) -> f64 {
        match self {
            Self::Daily => 365.0 / 12.0,
            Self::Weekly => 52.0 / 12.0,
            Self::Biweekly => 26.0 / 12.0,
            Self::Monthly => 1.0,
            Self::Quarterly => 1.0 / 3.0,
            Self::Yearly => 1.0 / 12.0,
        }
    }

    fn step(&self) -> CalendarStep {
        match self {
            Self::Daily => CalendarStep::Days(1),
            Self::Weekly => CalendarStep::Days(7),
            Self::Biweekly => CalendarStep::Days(14),
            Self::Monthly => CalendarStep::Months(1),
            Self::Quarterly => CalendarStep::Months(3),
            Self::Yearly => CalendarStep::Months(12),
        }
    }

    /// Move `date` forward by `steps` billing periods.
    ///
    /// Month-based frequencies are always computed from the anchor date, so a
    /// charge on the 31st lands on the last day of shorter months without
    /// drifting earlier on later periods. Returns `None` on calendar overflow.
    pub fn advance(&self, date: NaiveDate, steps: u32) -> Option<NaiveDate> {
        match self.step() {
            CalendarStep::Days(days) => date.checked_add_days(Days::new(days * u64::from(steps))),
            CalendarStep::Months(months) => {
                date.checked_add_months(Months::new(months.checked_mul(steps)?))
            }
        }
    }

    /// Whole periods elapsed from `from` to `to`, counted without stepping.
    ///
    /// Every step below the result lands on or before `to`, so callers can
    /// start searching there. Zero when `to` is not after `from`.
    pub fn periods_between(&self, from: NaiveDate, to: NaiveDate) -> u32 {
        let periods = match self.step() {
            CalendarStep::Days(days) => (to - from).num_days().max(0) as u64 / days,
            CalendarStep::Months(months) => {
                let elapsed = (i64::from(to.year()) - i64::from(from.year())) * 12
                    + i64::from(to.month())
                    - i64::from(from.month());
                elapsed.max(0) as u64 / u64::from(months)
            }
        };
        u32::try_from(periods).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring charge candidate produced by detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSubscription {
    /// Title-cased merchant pattern for display
    pub name: String,
    pub merchant_pattern: String,
    /// Average signed charge, rounded to cents (negative for expenses)
    pub amount: f64,
    pub frequency: Frequency,
    /// First expected charge strictly after the reference date
    pub next_renewal_date: NaiveDate,
    pub last_charge_date: NaiveDate,
    /// 0-100 heuristic score
    pub confidence: u32,
    pub transaction_count: usize,
    /// Most recent charges in the group, newest first
    pub sample_transactions: Vec<Transaction>,
}

impl DetectedSubscription {
    /// Approximate monthly cost as a positive number
    pub fn monthly_cost(&self) -> f64 {
        self.amount.abs() * self.frequency.charges_per_month()
    }
}

/// Result of a detection run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Candidates ordered by descending confidence
    pub detected: Vec<DetectedSubscription>,
    pub analyzed_transactions: usize,
}

impl DetectionReport {
    /// Sum of the monthly cost of every candidate
    pub fn estimated_monthly_total(&self) -> f64 {
        self.detected.iter().map(|d| d.monthly_cost()).sum()
    }
}
