//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use recur_core::test_utils::mixed_history;
use tower::ServiceExt;

fn setup_test_app() -> Router {
    let config = ServerConfig {
        require_auth: false,
        allowed_origins: vec![],
        ..Default::default()
    };
    create_router(DetectionConfig::default(), config)
}

fn setup_auth_app() -> Router {
    let config = ServerConfig {
        require_auth: true,
        api_keys: vec!["test-key-123".to_string()],
        ..Default::default()
    };
    create_router(DetectionConfig::default(), config)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn detect_body(today: Option<&str>, existing: &[&str]) -> serde_json::Value {
    let mut body = serde_json::json!({
        "transactions": mixed_history(),
        "existing_patterns": existing,
    });
    if let Some(today) = today {
        body["today"] = serde_json::json!(today);
    }
    body
}

// ========== Health Tests ==========

#[tokio::test]
async fn test_health() {
    let app = setup_auth_app();

    // Health is reachable without a key even when auth is required
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// ========== Detection Tests ==========

#[tokio::test]
async fn test_detect_subscriptions() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/subscriptions/detect",
            &detect_body(Some("2024-11-01"), &[]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;

    assert_eq!(
        json["analyzed_transactions"].as_u64().unwrap() as usize,
        mixed_history().len()
    );

    let detected = json["detected"].as_array().unwrap();
    assert_eq!(detected.len(), 2);

    let netflix = &detected[0];
    assert_eq!(netflix["merchant_pattern"], "netflix.com");
    assert_eq!(netflix["name"], "Netflix.com");
    assert_eq!(netflix["frequency"], "monthly");
    assert_eq!(netflix["amount"], -15.49);
    assert_eq!(netflix["last_charge_date"], "2024-10-15");
    assert_eq!(netflix["next_renewal_date"], "2024-11-15");
    assert_eq!(netflix["transaction_count"], 10);
    assert_eq!(netflix["sample_transactions"].as_array().unwrap().len(), 5);

    assert_eq!(detected[1]["merchant_pattern"], "spotify usa");
    assert!(
        netflix["confidence"].as_u64().unwrap() >= detected[1]["confidence"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn test_detect_excludes_existing_patterns() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/subscriptions/detect",
            &detect_body(Some("2024-11-01"), &["NETFLIX.COM"]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let detected = json["detected"].as_array().unwrap();
    assert_eq!(detected.len(), 1);
    assert_eq!(detected[0]["merchant_pattern"], "spotify usa");
}

#[tokio::test]
async fn test_detect_defaults_today() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/subscriptions/detect",
            &detect_body(None, &[]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let today = chrono::Utc::now().date_naive().to_string();

    // Renewal dates are projected past the current date
    for sub in json["detected"].as_array().unwrap() {
        assert!(sub["next_renewal_date"].as_str().unwrap() > today.as_str());
    }
}

#[tokio::test]
async fn test_detect_empty_history() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/subscriptions/detect",
            &serde_json::json!({ "transactions": [], "today": "2024-11-01" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["analyzed_transactions"], 0);
    assert!(json["detected"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_detect_rejects_too_many_transactions() {
    let config = ServerConfig {
        require_auth: false,
        max_transactions: 5,
        ..Default::default()
    };
    let app = create_router(DetectionConfig::default(), config);

    let response = app
        .oneshot(post_json(
            "/api/subscriptions/detect",
            &detect_body(Some("2024-11-01"), &[]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Too many transactions"));
}

#[tokio::test]
async fn test_detect_malformed_body() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/subscriptions/detect")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"transactions": [{"id": "1"}]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_detect_uses_configured_thresholds() {
    let detection = DetectionConfig {
        min_confidence: 95,
        ..Default::default()
    };
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    let app = create_router(detection, config);

    let response = app
        .oneshot(post_json(
            "/api/subscriptions/detect",
            &detect_body(Some("2024-11-01"), &[]),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    let detected = json["detected"].as_array().unwrap();
    assert_eq!(detected.len(), 1);
    assert_eq!(detected[0]["merchant_pattern"], "netflix.com");
}

// ========== Normalize Tests ==========

#[tokio::test]
async fn test_normalize_merchants() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/merchants/normalize",
            &serde_json::json!({
                "descriptions": ["NETFLIX.COM*10/01", "Acme Widgets LLC", "AB 1234"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let merchants = json.as_array().unwrap();
    assert_eq!(merchants.len(), 3);

    assert_eq!(merchants[0]["description"], "NETFLIX.COM*10/01");
    assert_eq!(merchants[0]["pattern"], "netflix.com");
    assert_eq!(merchants[0]["name"], "Netflix.com");
    assert_eq!(merchants[0]["groupable"], true);

    assert_eq!(merchants[1]["pattern"], "acme widgets");
    assert_eq!(merchants[1]["name"], "Acme Widgets");

    assert_eq!(merchants[2]["pattern"], "ab");
    assert_eq!(merchants[2]["groupable"], false);
}

// ========== Auth Tests ==========

#[tokio::test]
async fn test_auth_missing_key() {
    let app = setup_auth_app();

    let response = app
        .oneshot(post_json(
            "/api/subscriptions/detect",
            &detect_body(Some("2024-11-01"), &[]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn test_auth_wrong_key() {
    let app = setup_auth_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/merchants/normalize")
                .header("content-type", "application/json")
                .header("authorization", "Bearer wrong-key")
                .body(Body::from(r#"{"descriptions": ["NETFLIX"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_valid_key() {
    let app = setup_auth_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/merchants/normalize")
                .header("content-type", "application/json")
                .header("authorization", "Bearer test-key-123")
                .body(Body::from(r#"{"descriptions": ["NETFLIX"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_required_without_configured_keys() {
    let config = ServerConfig::default();
    let app = create_router(DetectionConfig::default(), config);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/merchants/normalize")
                .header("content-type", "application/json")
                .header("authorization", "Bearer anything")
                .body(Body::from(r#"{"descriptions": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_caller_identity() {
    let mut headers = axum::http::HeaderMap::new();
    assert_eq!(get_caller_identity(&headers), "local-dev");

    headers.insert("authorization", "Bearer k".parse().unwrap());
    assert_eq!(get_caller_identity(&headers), "api-key");
}

#[test]
fn test_is_valid_api_key() {
    let keys = vec!["alpha".to_string(), "beta".to_string()];
    assert!(is_valid_api_key("beta", &keys));
    assert!(!is_valid_api_key("bet", &keys));
    assert!(!is_valid_api_key("", &keys));
    assert!(!is_valid_api_key("alpha", &[]));
}

// ========== Security Header Tests ==========

#[tokio::test]
async fn test_security_headers() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}
