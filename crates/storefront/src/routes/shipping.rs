//! Shipping quote handler.
//!
//! `POST /shipping-quote` prices every enabled shipping method for one of the
//! caller's addresses and a cart. Cart contents are only used for weight.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::instrument;

use waybill_core::shipping::{CartLine, ShippingQuote};
use waybill_core::{AddressId, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::ShippingCalculator;
use crate::state::AppState;

/// Request body for a shipping quote.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub address_id: AddressId,
    pub cart_items: Vec<CartItem>,
}

/// One cart line as sent by the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductRef,
    pub quantity: i64,
}

/// Product ids arrive as strings from most clients, numbers from some.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Number(i32),
    Text(String),
}

impl ProductRef {
    fn parse(&self) -> Option<ProductId> {
        let id = match self {
            Self::Number(id) => Some(*id),
            Self::Text(text) => text.trim().parse::<i32>().ok(),
        };
        id.filter(|id| *id > 0).map(ProductId::new)
    }
}

impl QuoteRequest {
    /// Check every line and convert the cart to domain lines.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the first bad line.
    pub fn cart_lines(&self) -> Result<Vec<CartLine>> {
        self.cart_items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let product_id = item.product_id.parse().ok_or_else(|| {
                    AppError::Validation(format!("cartItems[{index}].productId is not a valid id"))
                })?;
                let quantity = u32::try_from(item.quantity)
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "cartItems[{index}].quantity must be a positive integer"
                        ))
                    })?;
                Ok(CartLine {
                    product_id,
                    quantity,
                })
            })
            .collect()
    }
}

/// Quote shipping for an address and cart.
///
/// # Errors
///
/// - 401 without a session identity
/// - 400 for a missing or malformed body
/// - 403 / 404 for a foreign or unknown address
/// - 500 if any lookup fails
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn quote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<Vec<ShippingQuote>>> {
    let Json(request) = payload?;
    let lines = request.cart_lines()?;

    let address_id = request.address_id.to_string();
    add_breadcrumb(
        "shipping",
        "Requested shipping quote",
        Some(&[("address_id", address_id.as_str())]),
    );

    let quotes = ShippingCalculator::postgres(state.pool())
        .quote(user.id, request.address_id, &lines)
        .await?;

    Ok(Json(quotes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(body: serde_json::Value) -> QuoteRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_product_ids_accept_strings_and_numbers() {
        let request = parse(serde_json::json!({
            "addressId": 4,
            "cartItems": [
                {"productId": "12", "quantity": 2},
                {"productId": 13, "quantity": 1}
            ]
        }));

        let lines = request.cart_lines().unwrap();

        assert_eq!(request.address_id, AddressId::new(4));
        assert_eq!(
            lines,
            vec![
                CartLine {
                    product_id: ProductId::new(12),
                    quantity: 2
                },
                CartLine {
                    product_id: ProductId::new(13),
                    quantity: 1
                },
            ]
        );
    }

    #[test]
    fn test_empty_cart_is_valid() {
        let request = parse(serde_json::json!({"addressId": 4, "cartItems": []}));
        assert!(request.cart_lines().unwrap().is_empty());
    }

    #[test]
    fn test_non_numeric_product_id_is_rejected() {
        let request = parse(serde_json::json!({
            "addressId": 4,
            "cartItems": [{"productId": "gid://shop/Product/1", "quantity": 1}]
        }));

        assert!(matches!(
            request.cart_lines(),
            Err(AppError::Validation(msg)) if msg.contains("cartItems[0].productId")
        ));
    }

    #[test]
    fn test_zero_and_negative_quantities_are_rejected() {
        for quantity in [0, -3] {
            let request = parse(serde_json::json!({
                "addressId": 4,
                "cartItems": [{"productId": "1", "quantity": quantity}]
            }));
            assert!(matches!(request.cart_lines(), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn test_missing_fields_fail_to_parse() {
        let missing_cart =
            serde_json::from_value::<QuoteRequest>(serde_json::json!({"addressId": 4}));
        let missing_address =
            serde_json::from_value::<QuoteRequest>(serde_json::json!({"cartItems": []}));

        assert!(missing_cart.is_err());
        assert!(missing_address.is_err());
    }
}
