//! Integration tests for `POST /shipping-quote`.
//!
//! These tests require:
//! - A migrated and seeded database (`waybill-cli migrate`, `waybill-cli seed`)
//! - The storefront running (`cargo run -p waybill-storefront`)
//! - `WAYBILL_TEST_SESSION_COOKIE` for a signed-in test user

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use waybill_integration_tests::{anonymous_client, base_url, session_client};

async fn create_address(city: &str) -> i64 {
    let resp = session_client()
        .post(format!("{}/account/addresses", base_url()))
        .json(&json!({
            "fullName": "Homer Simpson",
            "street": "742 Evergreen Terrace",
            "area": "Evergreen Terrace",
            "city": city,
            "zip": "49007",
            "country": "USA"
        }))
        .send()
        .await
        .expect("Failed to create address");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = anonymous_client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_quote_requires_session() {
    let resp = anonymous_client()
        .post(format!("{}/shipping-quote", base_url()))
        .json(&json!({"addressId": 1, "cartItems": []}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
#[ignore = "Requires running storefront server and a test session"]
async fn test_quote_rejects_missing_cart() {
    let resp = session_client()
        .post(format!("{}/shipping-quote", base_url()))
        .json(&json!({"addressId": 1}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
#[ignore = "Requires running storefront server and a test session"]
async fn test_quote_for_unknown_address_is_not_found() {
    let resp = session_client()
        .post(format!("{}/shipping-quote", base_url()))
        .json(&json!({"addressId": i32::MAX, "cartItems": []}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server, a test session and the example catalog"]
async fn test_quote_lists_applicable_methods_in_catalog_order() {
    let address_id = create_address("Springfield").await;

    let resp = session_client()
        .post(format!("{}/shipping-quote", base_url()))
        .json(&json!({
            "addressId": address_id,
            "cartItems": [{"productId": "1", "quantity": 2}]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let quotes: Vec<Value> = resp.json().await.unwrap();

    let titles: Vec<&str> = quotes.iter().filter_map(|q| q["title"].as_str()).collect();
    assert_eq!(titles, vec!["City courier", "Neighbourhood bike", "Freight"]);

    for quote in &quotes {
        assert!(quote["cost"].as_f64().unwrap() >= 0.0);
    }
}
