//! Per-method pricing.
//!
//! # Rules
//!
//! - Disabled methods are skipped.
//! - `weight`: `total_weight * cost_per_kg` (missing rate is zero).
//! - `city` / `area`: the first override keyed on the resolved location of the
//!   same kind, else `default_cost`. An area method never looks at the city.
//! - A method whose cost is undefined or negative is not applicable and is
//!   dropped. A cost of exactly zero is free shipping and is kept.
//! - Output keeps catalog order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::method::{CostStrategy, LocationOverride, ShippingMethod};
use crate::types::{AreaId, CityId, ShippingMethodId};

/// Canonical location ids resolved from an address's free-text fields.
///
/// Either id may be missing; pricing then falls back to default costs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub city: Option<CityId>,
    pub area: Option<AreaId>,
}

/// One priced, applicable shipping option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub id: ShippingMethodId,
    pub title: String,
    pub logo: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
}

impl CostStrategy {
    /// Raw cost for a destination and cart weight, before applicability
    /// filtering. `None` means the cost is undefined, which includes a weight
    /// price for a cart whose weight overflowed.
    #[must_use]
    pub fn cost(
        &self,
        location: ResolvedLocation,
        total_weight: Option<Decimal>,
    ) -> Option<Decimal> {
        match self {
            Self::Weight { cost_per_kg } => {
                total_weight?.checked_mul(cost_per_kg.unwrap_or(Decimal::ZERO))
            }
            Self::City {
                default_cost,
                overrides,
            } => matching_override(overrides, location.city).or(*default_cost),
            Self::Area {
                default_cost,
                overrides,
            } => matching_override(overrides, location.area).or(*default_cost),
        }
    }
}

fn matching_override<I: Copy + PartialEq>(
    overrides: &[LocationOverride<I>],
    location: Option<I>,
) -> Option<Decimal> {
    let location = location?;
    overrides
        .iter()
        .find(|o| o.location_id == location)
        .map(|o| o.cost)
}

/// Price every enabled method and keep the applicable ones, in input order.
///
/// `total_weight` is `None` when the cart weight overflowed; weight methods
/// are then dropped.
#[must_use]
pub fn quote_methods(
    methods: &[ShippingMethod],
    location: ResolvedLocation,
    total_weight: Option<Decimal>,
) -> Vec<ShippingQuote> {
    methods
        .iter()
        .filter(|method| method.enabled)
        .filter_map(|method| {
            let cost = method
                .strategy
                .cost(location, total_weight)
                .filter(|cost| *cost >= Decimal::ZERO)?;
            Some(ShippingQuote {
                id: method.id,
                title: method.title.clone(),
                logo: method.logo.clone(),
                cost,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::shipping::weight::{CartLine, total_weight};
    use crate::types::ProductId;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn method(id: i32, strategy: CostStrategy) -> ShippingMethod {
        ShippingMethod {
            id: ShippingMethodId::new(id),
            title: format!("Method {id}"),
            logo: None,
            enabled: true,
            position: id,
            strategy,
        }
    }

    fn city_method(
        id: i32,
        default_cost: Option<&str>,
        overrides: &[(i32, &str)],
    ) -> ShippingMethod {
        method(
            id,
            CostStrategy::City {
                default_cost: default_cost.map(d),
                overrides: overrides
                    .iter()
                    .map(|(location, cost)| LocationOverride {
                        location_id: CityId::new(*location),
                        cost: d(cost),
                    })
                    .collect(),
            },
        )
    }

    fn area_method(
        id: i32,
        default_cost: Option<&str>,
        overrides: &[(i32, &str)],
    ) -> ShippingMethod {
        method(
            id,
            CostStrategy::Area {
                default_cost: default_cost.map(d),
                overrides: overrides
                    .iter()
                    .map(|(location, cost)| LocationOverride {
                        location_id: AreaId::new(*location),
                        cost: d(cost),
                    })
                    .collect(),
            },
        )
    }

    fn weight_method(id: i32, cost_per_kg: Option<&str>) -> ShippingMethod {
        method(
            id,
            CostStrategy::Weight {
                cost_per_kg: cost_per_kg.map(d),
            },
        )
    }

    fn springfield() -> ResolvedLocation {
        ResolvedLocation {
            city: Some(CityId::new(7)),
            area: None,
        }
    }

    fn costs(quotes: &[ShippingQuote]) -> Vec<(i32, Decimal)> {
        quotes.iter().map(|q| (q.id.as_i32(), q.cost)).collect()
    }

    #[test]
    fn test_springfield_scenario() {
        let methods = [
            city_method(1, Some("10"), &[(7, "4")]),
            city_method(2, Some("10"), &[(8, "3")]),
            weight_method(3, Some("2")),
        ];

        let quotes = quote_methods(&methods, springfield(), Some(d("3.0")));

        assert_eq!(
            costs(&quotes),
            vec![(1, d("4")), (2, d("10")), (3, d("6"))]
        );
    }

    #[test]
    fn test_weight_cost_ignores_address() {
        let methods = [weight_method(1, Some("1.5"))];

        let here = quote_methods(&methods, springfield(), Some(d("4")));
        let nowhere = quote_methods(&methods, ResolvedLocation::default(), Some(d("4")));

        assert_eq!(costs(&here), vec![(1, d("6"))]);
        assert_eq!(here, nowhere);
    }

    #[test]
    fn test_overflowed_weight_drops_weight_methods() {
        let methods = [
            city_method(1, Some("10"), &[(7, "4")]),
            weight_method(2, Some("0.5")),
        ];
        let lines = [
            CartLine {
                product_id: ProductId::new(1),
                quantity: u32::MAX,
            },
            CartLine {
                product_id: ProductId::new(1),
                quantity: u32::MAX,
            },
        ];
        let weights = HashMap::from([(ProductId::new(1), Decimal::MAX)]);

        let quotes = quote_methods(&methods, springfield(), total_weight(&lines, &weights));

        assert_eq!(costs(&quotes), vec![(1, d("4"))]);
    }

    #[test]
    fn test_weight_cost_overflow_drops_method() {
        let quotes = quote_methods(
            &[weight_method(1, Some("2"))],
            springfield(),
            Some(Decimal::MAX),
        );
        assert!(quotes.is_empty());
    }

    #[test]
    fn test_weight_without_rate_is_free() {
        let quotes = quote_methods(&[weight_method(1, None)], springfield(), Some(d("12")));
        assert_eq!(costs(&quotes), vec![(1, Decimal::ZERO)]);
    }

    #[test]
    fn test_area_method_ignores_city_id_collision() {
        // City 7 and area 7 share a number; only the area id may match.
        let methods = [area_method(1, Some("9"), &[(7, "1")])];

        let quotes = quote_methods(&methods, springfield(), Some(Decimal::ZERO));

        assert_eq!(costs(&quotes), vec![(1, d("9"))]);
    }

    #[test]
    fn test_area_override_matches_resolved_area() {
        let methods = [area_method(1, Some("9"), &[(3, "1")])];
        let location = ResolvedLocation {
            city: Some(CityId::new(7)),
            area: Some(AreaId::new(3)),
        };

        let quotes = quote_methods(&methods, location, Some(Decimal::ZERO));

        assert_eq!(costs(&quotes), vec![(1, d("1"))]);
    }

    #[test]
    fn test_unresolved_city_uses_default_cost() {
        let methods = [city_method(1, Some("10"), &[(7, "4")])];

        let quotes =
            quote_methods(&methods, ResolvedLocation::default(), Some(Decimal::ZERO));

        assert_eq!(costs(&quotes), vec![(1, d("10"))]);
    }

    #[test]
    fn test_first_matching_override_wins() {
        let methods = [city_method(1, Some("10"), &[(7, "4"), (7, "2")])];

        let quotes = quote_methods(&methods, springfield(), Some(Decimal::ZERO));

        assert_eq!(costs(&quotes), vec![(1, d("4"))]);
    }

    #[test]
    fn test_disabled_methods_never_appear() {
        let mut free = weight_method(1, None);
        free.enabled = false;
        let methods = [free, city_method(2, Some("5"), &[])];

        let quotes = quote_methods(&methods, springfield(), Some(d("1")));

        assert_eq!(costs(&quotes), vec![(2, d("5"))]);
    }

    #[test]
    fn test_negative_and_undefined_costs_are_dropped() {
        let methods = [
            city_method(1, Some("-1"), &[]),
            city_method(2, None, &[]),
            city_method(3, Some("10"), &[(7, "-0.01")]),
            city_method(4, Some("0"), &[]),
        ];

        let quotes = quote_methods(&methods, springfield(), Some(Decimal::ZERO));

        assert_eq!(costs(&quotes), vec![(4, Decimal::ZERO)]);
    }

    #[test]
    fn test_override_rescues_missing_default() {
        let methods = [city_method(1, None, &[(7, "3")])];

        let quotes = quote_methods(&methods, springfield(), Some(Decimal::ZERO));

        assert_eq!(costs(&quotes), vec![(1, d("3"))]);
    }

    #[test]
    fn test_catalog_order_is_preserved() {
        let methods = [
            city_method(5, Some("30"), &[]),
            city_method(2, Some("1"), &[]),
            city_method(9, Some("15"), &[]),
        ];

        let ids: Vec<i32> = quote_methods(&methods, springfield(), Some(Decimal::ZERO))
            .iter()
            .map(|q| q.id.as_i32())
            .collect();

        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn test_quote_serializes_cost_as_number() {
        let quote = ShippingQuote {
            id: ShippingMethodId::new(1),
            title: "Courier".to_owned(),
            logo: None,
            cost: d("4.5"),
        };

        let json = serde_json::to_value(&quote).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": 1, "title": "Courier", "logo": null, "cost": 4.5})
        );
    }
}
