//! Loading detection inputs from files
//!
//! Transactions come from a JSON array or a CSV export with a header row.
//! Already-tracked merchant patterns come from JSON or a plain text list.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ExistingPatterns, ExistingSubscriptionPattern, Transaction};

/// Account assigned to CSV rows without an `account_id` column
pub const DEFAULT_ACCOUNT_ID: &str = "default";

/// Input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
    Text,
}

impl InputFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "txt" | "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Load transactions from a `.json` or `.csv` file
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let format = InputFormat::from_path(path);
    let file = File::open(path)?;
    let transactions = match format {
        Some(InputFormat::Json) => parse_transactions_json(file)?,
        Some(InputFormat::Csv) => parse_transactions_csv(file)?,
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "{} (expected .json or .csv)",
                path.display()
            )))
        }
    };
    debug!(
        "Loaded {} transactions from {}",
        transactions.len(),
        path.display()
    );
    Ok(transactions)
}

/// Parse a JSON array of transactions
pub fn parse_transactions_json<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let transactions: Vec<Transaction> = serde_json::from_reader(reader)?;
    for (i, tx) in transactions.iter().enumerate() {
        if !tx.amount.is_finite() {
            return Err(Error::InvalidData(format!(
                "Transaction {} (index {}) has a non-finite amount",
                tx.id, i
            )));
        }
    }
    Ok(transactions)
}

/// Column positions resolved from a CSV header row
struct CsvColumns {
    id: Option<usize>,
    date: usize,
    amount: usize,
    description: usize,
    account_id: Option<usize>,
}

impl CsvColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let required = |name: &str| {
            positions
                .get(name)
                .copied()
                .ok_or_else(|| Error::InvalidData(format!("Missing CSV column: {}", name)))
        };

        Ok(Self {
            id: positions.get("id").copied(),
            date: required("date")?,
            amount: required("amount")?,
            description: required("description")?,
            account_id: positions.get("account_id").copied(),
        })
    }
}

/// Parse a CSV export with columns `id,date,amount,description,account_id`.
///
/// Column order is free and header names are case-insensitive. `id` and
/// `account_id` are optional; rows without an id are numbered.
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = CsvColumns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = i + 2;

        let field = |col: usize, name: &str| {
            record
                .get(col)
                .ok_or_else(|| Error::InvalidData(format!("Line {}: missing {}", line, name)))
        };

        let date = parse_date(field(columns.date, "date")?)
            .map_err(|e| Error::InvalidData(format!("Line {}: {}", line, e)))?;
        let amount = parse_amount(field(columns.amount, "amount")?)
            .map_err(|e| Error::InvalidData(format!("Line {}: {}", line, e)))?;
        let description = field(columns.description, "description")?.to_string();

        let id = columns
            .id
            .and_then(|col| record.get(col))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("row-{}", i + 1));
        let account_id = columns
            .account_id
            .and_then(|col| record.get(col))
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ACCOUNT_ID)
            .to_string();

        transactions.push(Transaction {
            id,
            date,
            amount,
            description,
            account_id,
        });
    }

    debug!("Parsed {} CSV transactions", transactions.len());
    Ok(transactions)
}

/// Entry in a JSON pattern list: a bare string or a pattern record
#[derive(Deserialize)]
#[serde(untagged)]
enum PatternEntry {
    Plain(String),
    Record(ExistingSubscriptionPattern),
}

/// Load already-tracked merchant patterns.
///
/// `.json` files hold an array of strings or `{"merchant_pattern": ...}`
/// objects. `.txt` files and files without a known extension are read as one
/// pattern per line, skipping blank lines and `#` comments.
pub fn load_existing_patterns(path: &Path) -> Result<ExistingPatterns> {
    let format = InputFormat::from_path(path);
    let file = File::open(path)?;
    let patterns = match format {
        Some(InputFormat::Json) => parse_patterns_json(file)?,
        Some(InputFormat::Text) | None => parse_patterns_text(file)?,
        Some(InputFormat::Csv) => {
            return Err(Error::UnsupportedFormat(format!(
                "{} (pattern lists are .json or plain text)",
                path.display()
            )))
        }
    };
    debug!(
        "Loaded {} existing patterns from {}",
        patterns.len(),
        path.display()
    );
    Ok(patterns)
}

pub fn parse_patterns_json<R: Read>(reader: R) -> Result<ExistingPatterns> {
    let entries: Vec<PatternEntry> = serde_json::from_reader(reader)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            PatternEntry::Plain(p) => p,
            PatternEntry::Record(r) => r.merchant_pattern,
        })
        .collect())
}

pub fn parse_patterns_text<R: Read>(reader: R) -> Result<ExistingPatterns> {
    let mut patterns = ExistingPatterns::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        patterns.insert(line);
    }
    Ok(patterns)
}

/// Parse a date in ISO or US statement format
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    // chrono's %Y also accepts a two-digit year, so pick %y by field width
    let short_year = s.contains('/') && s.rsplit('/').next().is_some_and(|y| y.len() == 2);
    let formats: &[&str] = if short_year {
        &["%m/%d/%y"] // 01/15/24
    } else {
        &[
            "%Y-%m-%d", // 2024-01-15
            "%m/%d/%Y", // 01/15/2024
        ]
    };

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::InvalidData(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .ok_or_else(|| Error::InvalidData(format!("Unable to parse amount: {}", s)))
}
