//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (database)
//!
//! # Shipping (requires auth)
//! POST /shipping-quote                - Quote enabled methods for an address and cart
//!
//! # Address book (requires auth)
//! GET    /account/addresses               - List addresses, primary first
//! POST   /account/addresses               - Create address
//! PUT    /account/addresses/{id}          - Update address
//! DELETE /account/addresses/{id}          - Delete non-primary address
//! POST   /account/addresses/{id}/primary  - Make address primary
//! ```

pub mod addresses;
pub mod shipping;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new().route("/shipping-quote", post(shipping::quote))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(addresses::index).post(addresses::create))
        .route(
            "/addresses/{id}",
            put(addresses::update).delete(addresses::delete),
        )
        .route("/addresses/{id}/primary", post(addresses::set_primary))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(shipping_routes())
        .nest("/account", account_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header::CONTENT_TYPE},
    };
    use tower::ServiceExt;

    use super::*;

    async fn send(method: Method, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let app = routes().with_state(AppState::for_tests());
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_quote_without_session_is_unauthorized() {
        let (status, body) = send(
            Method::POST,
            "/shipping-quote",
            r#"{"addressId": 1, "cartItems": []}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn test_address_book_without_session_is_unauthorized() {
        let (status, body) = send(Method::GET, "/account/addresses", "").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn test_delete_without_session_is_unauthorized() {
        let (status, _) = send(Method::DELETE, "/account/addresses/3", "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
