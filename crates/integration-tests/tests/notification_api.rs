//! Live HTTP tests against a running notification server.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running (cargo run -p attar-server)
//! - `ATTAR_TEST_TOKEN` set to a valid row in `api_token`
//!
//! Run with: cargo test -p attar-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the notification API (configurable via environment).
fn base_url() -> String {
    std::env::var("ATTAR_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn test_token() -> String {
    std::env::var("ATTAR_TEST_TOKEN").expect("ATTAR_TEST_TOKEN must be set for live tests")
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health_endpoint() {
    let resp = Client::new()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("server reachable");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_checkout_rejects_missing_token() {
    let resp = Client::new()
        .post(format!("{}/api/checkout/notification", base_url()))
        .json(&json!({
            "userId": Uuid::new_v4(),
            "cartItems": [{ "productTitle": "Oud Intense", "quantity": 1, "price": "100" }],
            "totalPrice": "100"
        }))
        .send()
        .await
        .expect("server reachable");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("JSON error body");
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_checkout_rejects_garbage_token() {
    let resp = Client::new()
        .post(format!("{}/api/checkout/notification", base_url()))
        .bearer_auth("definitely-not-a-token")
        .json(&json!({
            "userId": Uuid::new_v4(),
            "cartItems": [{ "productTitle": "Oud Intense", "quantity": 1, "price": "100" }],
            "totalPrice": "100"
        }))
        .send()
        .await
        .expect("server reachable");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and test token"]
async fn test_checkout_rejects_foreign_user_id() {
    // A valid token paired with someone else's userId must be forbidden,
    // not just unauthorized.
    let resp = Client::new()
        .post(format!("{}/api/checkout/notification", base_url()))
        .bearer_auth(test_token())
        .json(&json!({
            "userId": Uuid::new_v4(),
            "cartItems": [{ "productTitle": "Oud Intense", "quantity": 1, "price": "100" }],
            "totalPrice": "100"
        }))
        .send()
        .await
        .expect("server reachable");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server and test token"]
async fn test_validation_errors_are_bad_request() {
    let resp = Client::new()
        .post(format!("{}/api/checkout/notification", base_url()))
        .bearer_auth(test_token())
        .json(&json!({
            "userId": Uuid::new_v4(),
            "cartItems": [],
            "totalPrice": "100"
        }))
        .send()
        .await
        .expect("server reachable");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("JSON error body");
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .contains("cartItems")
    );
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_public_review_listing_needs_no_token() {
    let resp = Client::new()
        .get(format!(
            "{}/api/products/{}/reviews",
            base_url(),
            Uuid::new_v4()
        ))
        .send()
        .await
        .expect("server reachable");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("JSON body");
    assert!(body.is_array());
}
