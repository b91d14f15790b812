//! Shipping methods and their cost strategies.
//!
//! A method row stores `cost_type`, a nullable `default_cost` and a JSONB
//! `config`. The blob is loosely shaped (`cost_per_kg` for weight methods,
//! `overrides` for city/area methods), so it is parsed into [`CostStrategy`],
//! where each variant carries only what it needs and override ids are typed by
//! location kind.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AreaId, CityId, CostType, LocationKind, ShippingMethodId};

/// Errors raised when a method definition cannot be written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodConfigError {
    #[error("shipping method title must not be empty")]
    EmptyTitle,

    #[error("default_cost is required for {0} shipping methods")]
    MissingDefaultCost(CostType),
}

/// A cost exception for a single location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOverride<I> {
    pub location_id: I,
    pub cost: Decimal,
}

/// How a method computes its cost, keyed by `cost_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostStrategy {
    /// City override for the address's city, else `default_cost`.
    City {
        default_cost: Option<Decimal>,
        overrides: Vec<LocationOverride<CityId>>,
    },
    /// Area override for the address's area, else `default_cost`.
    ///
    /// Never falls back to a city-level price.
    Area {
        default_cost: Option<Decimal>,
        overrides: Vec<LocationOverride<AreaId>>,
    },
    /// `total_weight * cost_per_kg`; a missing rate counts as zero.
    Weight { cost_per_kg: Option<Decimal> },
}

/// The JSONB `config` blob as stored on `shop.shipping_method`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_kg: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<StoredOverride>,
}

/// One entry of `config.overrides`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOverride {
    #[serde(rename = "type")]
    pub kind: LocationKind,
    #[serde(rename = "locationId", alias = "location_id")]
    pub location_id: i32,
    pub cost: Decimal,
}

impl CostStrategy {
    /// The `cost_type` discriminator for this strategy.
    #[must_use]
    pub const fn cost_type(&self) -> CostType {
        match self {
            Self::City { .. } => CostType::City,
            Self::Area { .. } => CostType::Area,
            Self::Weight { .. } => CostType::Weight,
        }
    }

    /// The fallback cost for location strategies.
    #[must_use]
    pub const fn default_cost(&self) -> Option<Decimal> {
        match self {
            Self::City { default_cost, .. } | Self::Area { default_cost, .. } => *default_cost,
            Self::Weight { .. } => None,
        }
    }

    /// Build a strategy from a stored row.
    ///
    /// Overrides whose `type` does not match `cost_type` are ignored, as are
    /// fields that belong to other cost types.
    #[must_use]
    pub fn from_stored(
        cost_type: CostType,
        default_cost: Option<Decimal>,
        config: &StoredConfig,
    ) -> Self {
        match cost_type {
            CostType::City => Self::City {
                default_cost,
                overrides: overrides_of_kind(&config.overrides, LocationKind::City, CityId::new),
            },
            CostType::Area => Self::Area {
                default_cost,
                overrides: overrides_of_kind(&config.overrides, LocationKind::Area, AreaId::new),
            },
            CostType::Weight => Self::Weight {
                cost_per_kg: config.cost_per_kg,
            },
        }
    }

    /// The `(default_cost, config)` pair to persist for this strategy.
    #[must_use]
    pub fn to_stored(&self) -> (Option<Decimal>, StoredConfig) {
        match self {
            Self::City {
                default_cost,
                overrides,
            } => (
                *default_cost,
                StoredConfig {
                    cost_per_kg: None,
                    overrides: overrides
                        .iter()
                        .map(|o| StoredOverride {
                            kind: LocationKind::City,
                            location_id: o.location_id.as_i32(),
                            cost: o.cost,
                        })
                        .collect(),
                },
            ),
            Self::Area {
                default_cost,
                overrides,
            } => (
                *default_cost,
                StoredConfig {
                    cost_per_kg: None,
                    overrides: overrides
                        .iter()
                        .map(|o| StoredOverride {
                            kind: LocationKind::Area,
                            location_id: o.location_id.as_i32(),
                            cost: o.cost,
                        })
                        .collect(),
                },
            ),
            Self::Weight { cost_per_kg } => (
                None,
                StoredConfig {
                    cost_per_kg: *cost_per_kg,
                    overrides: Vec::new(),
                },
            ),
        }
    }
}

fn overrides_of_kind<I>(
    stored: &[StoredOverride],
    kind: LocationKind,
    make_id: fn(i32) -> I,
) -> Vec<LocationOverride<I>> {
    stored
        .iter()
        .filter(|o| o.kind == kind)
        .map(|o| LocationOverride {
            location_id: make_id(o.location_id),
            cost: o.cost,
        })
        .collect()
}

/// A configured shipping method as read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub title: String,
    pub logo: Option<String>,
    pub enabled: bool,
    /// Catalog order; quotes are returned in this order.
    pub position: i32,
    pub strategy: CostStrategy,
}

/// A method definition about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingMethodDraft {
    pub title: String,
    pub logo: Option<String>,
    pub enabled: bool,
    pub position: i32,
    pub cost_type: CostType,
    pub default_cost: Option<Decimal>,
    pub config: StoredConfig,
}

/// A draft that passed validation, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMethod {
    pub title: String,
    pub logo: Option<String>,
    pub enabled: bool,
    pub position: i32,
    pub strategy: CostStrategy,
    /// Overrides discarded because their `type` did not match `cost_type`.
    pub dropped_overrides: usize,
}

impl ShippingMethodDraft {
    /// Validate the draft and shape its config to match `cost_type`.
    ///
    /// # Errors
    ///
    /// Returns `MethodConfigError::EmptyTitle` for a blank title and
    /// `MethodConfigError::MissingDefaultCost` for a city/area method without
    /// a default cost.
    pub fn normalize(self) -> Result<NormalizedMethod, MethodConfigError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(MethodConfigError::EmptyTitle);
        }

        let dropped_overrides = match self.cost_type.location_kind() {
            Some(kind) => {
                if self.default_cost.is_none() {
                    return Err(MethodConfigError::MissingDefaultCost(self.cost_type));
                }
                self.config
                    .overrides
                    .iter()
                    .filter(|o| o.kind != kind)
                    .count()
            }
            None => self.config.overrides.len(),
        };

        let strategy = CostStrategy::from_stored(self.cost_type, self.default_cost, &self.config);
        let logo = self
            .logo
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty());

        Ok(NormalizedMethod {
            title,
            logo,
            enabled: self.enabled,
            position: self.position,
            strategy,
            dropped_overrides,
        })
    }
}
