//! Cart weight aggregation.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One line of the caller's cart. Only used to look up weight, never price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Product ids appearing in `lines`, each once, in first-seen order.
///
/// Used to fetch each product's weight a single time.
#[must_use]
pub fn distinct_products(lines: &[CartLine]) -> Vec<ProductId> {
    let mut seen = HashSet::with_capacity(lines.len());
    lines
        .iter()
        .map(|line| line.product_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Total shipment weight in kilograms.
///
/// Every line contributes `unit_weight * quantity`, including repeated lines
/// for the same product. Products missing from `unit_weights` weigh nothing.
/// Returns `None` if the total overflows.
#[must_use]
pub fn total_weight(
    lines: &[CartLine],
    unit_weights: &HashMap<ProductId, Decimal>,
) -> Option<Decimal> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        let unit = unit_weights
            .get(&line.product_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        total.checked_add(unit.checked_mul(Decimal::from(line.quantity))?)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn line(product: i32, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(product),
            quantity,
        }
    }

    #[test]
    fn test_repeated_lines_are_summed_separately() {
        let lines = [line(1, 2), line(1, 3)];
        let weights = HashMap::from([(ProductId::new(1), d("0.5"))]);

        assert_eq!(total_weight(&lines, &weights), Some(d("2.5")));
    }

    #[test]
    fn test_distinct_products_dedupes_in_order() {
        let lines = [line(3, 1), line(1, 2), line(3, 4), line(2, 1), line(1, 1)];

        assert_eq!(
            distinct_products(&lines),
            vec![ProductId::new(3), ProductId::new(1), ProductId::new(2)]
        );
    }

    #[test]
    fn test_missing_weight_counts_as_zero() {
        let lines = [line(1, 2), line(2, 10)];
        let weights = HashMap::from([(ProductId::new(1), d("1.25"))]);

        assert_eq!(total_weight(&lines, &weights), Some(d("2.5")));
    }

    #[test]
    fn test_overflowing_cart_has_no_weight() {
        let lines = [line(1, u32::MAX), line(1, u32::MAX)];
        let weights = HashMap::from([(ProductId::new(1), Decimal::MAX)]);

        assert_eq!(total_weight(&lines, &weights), None);
    }

    #[test]
    fn test_empty_cart_weighs_nothing() {
        assert_eq!(total_weight(&[], &HashMap::new()), Some(Decimal::ZERO));
        assert!(distinct_products(&[]).is_empty());
    }

    #[test]
    fn test_cart_line_deserializes_from_json() {
        let parsed: CartLine =
            serde_json::from_str(r#"{"product_id": 5, "quantity": 3}"#).unwrap();
        assert_eq!(parsed, line(5, 3));
    }
}
