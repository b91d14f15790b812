//! Integration tests for Waybill.
//!
//! # Running Tests
//!
//! ```bash
//! # Catalog file checks run with the normal test suite
//! cargo test -p waybill-integration-tests
//!
//! # Server and database tests are ignored by default
//! WAYBILL_BASE_URL=http://localhost:3000 \
//! WAYBILL_TEST_SESSION_COOKIE='wb_session=...' \
//! WAYBILL_DATABASE_URL=postgres://... \
//! cargo test -p waybill-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `WAYBILL_BASE_URL` - Running storefront (default `http://localhost:3000`)
//! - `WAYBILL_TEST_SESSION_COOKIE` - A `wb_session=...` cookie for a signed-in
//!   test user, issued by the authentication service
//! - `WAYBILL_DATABASE_URL` - Migrated database for repository tests

use std::path::PathBuf;

use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use sqlx::PgPool;
use waybill_core::UserId;

/// Base URL of the running storefront.
#[must_use]
pub fn base_url() -> String {
    std::env::var("WAYBILL_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client without any session.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn anonymous_client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// Client that sends the test user's session cookie on every request.
///
/// # Panics
///
/// Panics if `WAYBILL_TEST_SESSION_COOKIE` is unset or not a valid header value.
#[must_use]
pub fn session_client() -> Client {
    let cookie = std::env::var("WAYBILL_TEST_SESSION_COOKIE")
        .expect("WAYBILL_TEST_SESSION_COOKIE must be set");

    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&cookie).expect("Invalid session cookie"),
    );

    Client::builder()
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// Path to the example catalog shipped with the storefront.
#[must_use]
pub fn example_catalog() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../storefront/seed/catalog.example.yaml")
}

/// Connect to the migrated test database.
///
/// # Panics
///
/// Panics if neither `WAYBILL_DATABASE_URL` nor `DATABASE_URL` is set, or the
/// database is unreachable.
pub async fn database_pool() -> PgPool {
    let url = std::env::var("WAYBILL_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("WAYBILL_DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to the test database")
}

/// Insert a fresh user with a unique email.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn create_user(pool: &PgPool, name: &str) -> UserId {
    sqlx::query_scalar(
        r#"
        INSERT INTO shop."user" (email)
        VALUES ($1 || '+' || gen_random_uuid() || '@example.com')
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("Failed to create test user")
}
