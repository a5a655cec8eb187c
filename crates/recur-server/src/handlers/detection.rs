//! Recurring charge detection and merchant normalization handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{get_caller_identity, AppError, AppState};
use recur_core::{
    display_name, normalize::is_groupable, normalize_merchant, DetectionReport, ExistingPatterns,
    Transaction,
};

/// Detection request body
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub transactions: Vec<Transaction>,
    /// Merchant patterns the caller already tracks
    #[serde(default)]
    pub existing_patterns: Vec<String>,
    /// Reference date for renewal projection (defaults to today, UTC)
    pub today: Option<NaiveDate>,
}

/// POST /api/subscriptions/detect - Find recurring charges in a transaction history
pub async fn detect_subscriptions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DetectRequest>,
) -> Result<Json<DetectionReport>, AppError> {
    let caller = get_caller_identity(&headers);
    let limit = state.config.max_transactions;

    if body.transactions.len() > limit {
        return Err(AppError::bad_request(&format!(
            "Too many transactions: {} (max {})",
            body.transactions.len(),
            limit
        )));
    }

    let today = body.today.unwrap_or_else(|| Utc::now().date_naive());
    let existing: ExistingPatterns = body.existing_patterns.iter().collect();

    // Detection is CPU-bound; keep it off the async workers
    let worker_state = state.clone();
    let transactions = body.transactions;
    let report = tokio::task::spawn_blocking(move || {
        worker_state
            .detector
            .detect(&transactions, &existing, today)
    })
    .await?;

    info!(
        caller = %caller,
        analyzed = report.analyzed_transactions,
        detected = report.detected.len(),
        "Detection request served"
    );

    Ok(Json(report))
}

/// Merchant normalization request body
#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub descriptions: Vec<String>,
}

/// How a single description groups
#[derive(Debug, Serialize)]
pub struct NormalizedMerchant {
    pub description: String,
    pub pattern: String,
    pub name: String,
    pub groupable: bool,
}

/// POST /api/merchants/normalize - Show the merchant pattern for each description
pub async fn normalize_merchants(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NormalizeRequest>,
) -> Result<Json<Vec<NormalizedMerchant>>, AppError> {
    if body.descriptions.len() > state.config.max_transactions {
        return Err(AppError::bad_request(&format!(
            "Too many descriptions (max {})",
            state.config.max_transactions
        )));
    }

    let min_len = state.detector.config().min_pattern_len;
    let merchants = body
        .descriptions
        .into_iter()
        .map(|description| {
            let pattern = normalize_merchant(&description);
            NormalizedMerchant {
                name: display_name(&pattern),
                groupable: is_groupable(&pattern, min_len),
                pattern,
                description,
            }
        })
        .collect();

    Ok(Json(merchants))
}
