//! Cost strategy and location discriminators.
//!
//! Both enums are stored as lowercase text: `cost_type` is a `TEXT` column on
//! `shop.shipping_method`, and the override `type` lives inside the JSONB
//! config blob.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a stored discriminator is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {what}: {value}")]
pub struct ParseKindError {
    what: &'static str,
    value: String,
}

/// How a shipping method prices itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostType {
    /// Default cost with per-city overrides.
    City,
    /// Default cost with per-area overrides.
    Area,
    /// Total cart weight times a per-kilogram rate.
    Weight,
}

impl CostType {
    /// The location kind whose overrides apply to this cost type, if any.
    #[must_use]
    pub const fn location_kind(self) -> Option<LocationKind> {
        match self {
            Self::City => Some(LocationKind::City),
            Self::Area => Some(LocationKind::Area),
            Self::Weight => None,
        }
    }

    /// Stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Area => "area",
            Self::Weight => "weight",
        }
    }
}

impl std::fmt::Display for CostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CostType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city" => Ok(Self::City),
            "area" => Ok(Self::Area),
            "weight" => Ok(Self::Weight),
            _ => Err(ParseKindError {
                what: "cost type",
                value: s.to_owned(),
            }),
        }
    }
}

/// The kind of location an override is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    City,
    Area,
}

impl LocationKind {
    /// Stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Area => "area",
        }
    }
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LocationKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city" => Ok(Self::City),
            "area" => Ok(Self::Area),
            _ => Err(ParseKindError {
                what: "location kind",
                value: s.to_owned(),
            }),
        }
    }
}
