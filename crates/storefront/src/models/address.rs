//! Address domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use waybill_core::{AddressId, UserId};

/// A user's shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub street: String,
    pub apartment: Option<String>,
    /// Free-text area name, resolved against `shop.area` within the city.
    pub area: Option<String>,
    pub state: Option<String>,
    /// Free-text city name, resolved against `shop.city` within the country.
    pub city: String,
    pub zip: String,
    /// Free-text country name.
    pub country: String,
    /// Whether this is the user's default shipping address.
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address fields supplied on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub street: String,
    pub apartment: Option<String>,
    pub area: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
    /// Make this the primary address.
    #[serde(default)]
    pub is_primary: bool,
}

impl AddressInput {
    /// Trim every field and turn blank optional fields into `None`.
    ///
    /// # Errors
    ///
    /// Returns the names of required fields that are blank.
    pub fn normalize(self) -> Result<Self, Vec<&'static str>> {
        let required = |value: String| value.trim().to_owned();
        let optional = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let input = Self {
            full_name: required(self.full_name),
            street: required(self.street),
            apartment: optional(self.apartment),
            area: optional(self.area),
            state: optional(self.state),
            city: required(self.city),
            zip: required(self.zip),
            country: required(self.country),
            is_primary: self.is_primary,
        };

        let missing: Vec<&'static str> = [
            ("fullName", &input.full_name),
            ("street", &input.street),
            ("city", &input.city),
            ("zip", &input.zip),
            ("country", &input.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(input)
        } else {
            Err(missing)
        }
    }
}
