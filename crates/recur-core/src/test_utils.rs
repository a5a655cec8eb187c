//! Test utilities for building transaction fixtures
//!
//! Enabled for this crate's tests and, through the `test-utils` feature,
//! for the CLI and server test suites.

use chrono::NaiveDate;

use crate::models::{Frequency, Transaction};

/// Parse a `YYYY-MM-DD` date, panicking on bad fixtures
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| panic!("bad fixture date: {}", s))
}

/// Build a transaction on the default test account
pub fn tx(id: &str, on: &str, amount: f64, description: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        date: date(on),
        amount,
        description: description.to_string(),
        account_id: "acct_test".to_string(),
    }
}

/// Build `count` identical charges spaced one billing period apart
pub fn recurring_charges(
    description: &str,
    amount: f64,
    first: &str,
    frequency: Frequency,
    count: u32,
) -> Vec<Transaction> {
    let start = date(first);
    (0..count)
        .map(|i| {
            let on = frequency
                .advance(start, i)
                .unwrap_or_else(|| panic!("fixture date overflow for {}", description));
            Transaction {
                id: format!("{}_{}", description.replace(' ', "_").to_lowercase(), i),
                date: on,
                amount,
                description: description.to_string(),
                account_id: "acct_test".to_string(),
            }
        })
        .collect()
}

/// A year of mixed activity: two subscriptions, groceries, and payroll
pub fn mixed_history() -> Vec<Transaction> {
    let mut txs = Vec::new();
    txs.extend(recurring_charges(
        "NETFLIX.COM",
        -15.49,
        "2024-01-15",
        Frequency::Monthly,
        10,
    ));
    txs.extend(recurring_charges(
        "SPOTIFY USA",
        -10.99,
        "2024-01-20",
        Frequency::Monthly,
        2,
    ));
    // Same store, irregular visits and amounts
    txs.push(tx("g1", "2024-01-03", -84.12, "SAFEWAY #1234"));
    txs.push(tx("g2", "2024-01-09", -23.40, "SAFEWAY #1234"));
    txs.push(tx("g3", "2024-02-21", -131.75, "SAFEWAY #1234"));
    // Income never counts
    txs.extend(recurring_charges(
        "ACME PAYROLL",
        2500.00,
        "2024-01-01",
        Frequency::Biweekly,
        8,
    ));
    txs
}
