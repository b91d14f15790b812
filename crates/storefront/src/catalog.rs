//! Catalog seeding from YAML.
//!
//! Loads locations, product weights and shipping methods, validates the whole
//! file, then upserts everything inside one transaction. Overrides refer to
//! locations by name and are resolved to ids while seeding.
//!
//! A single method can also be loaded on its own ([`load_method_file`]) and
//! resolved against the stored locations ([`resolve_method`]) before it is
//! created or updated.
//!
//! ## YAML Format
//!
//! ```yaml
//! countries:
//!   - name: USA
//!     cities:
//!       - name: Springfield
//!         areas: [Evergreen Terrace, Downtown]
//!
//! products:
//!   - sku: DONUT-PINK
//!     title: Pink frosted donut
//!     weight_kg: 0.25
//!
//! shipping_methods:
//!   - title: City courier
//!     cost_type: city
//!     default_cost: 10
//!     overrides:
//!       - { country: USA, city: Springfield, cost: 4 }
//!   - title: Neighbourhood bike
//!     cost_type: area
//!     default_cost: 9
//!     overrides:
//!       - { country: USA, city: Springfield, area: Evergreen Terrace, cost: 2 }
//!   - title: Freight
//!     cost_type: weight
//!     cost_per_kg: 2
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info, instrument};

use waybill_core::shipping::{ShippingMethodDraft, StoredConfig, StoredOverride};
use waybill_core::types::{CostType, LocationKind};
use waybill_core::{AreaId, CityId};

use crate::db::shipping_methods::{WriteMethodError, upsert_by_title};
use crate::db::{LocationRepository, RepositoryError, locations, products};

/// Errors that can occur while seeding the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{} validation errors found", .0.len())]
    Invalid(Vec<String>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Method(#[from] WriteMethodError),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Full seed file.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub countries: Vec<CountrySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
    #[serde(default)]
    pub shipping_methods: Vec<MethodSeed>,
}

#[derive(Debug, Deserialize)]
pub struct CountrySeed {
    pub name: String,
    #[serde(default)]
    pub cities: Vec<CitySeed>,
}

#[derive(Debug, Deserialize)]
pub struct CitySeed {
    pub name: String,
    #[serde(default)]
    pub areas: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub sku: String,
    pub title: String,
    /// Unit weight in kilograms; omitted means weightless.
    pub weight_kg: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct MethodSeed {
    pub title: String,
    pub logo: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Catalog position; defaults to file order.
    pub position: Option<i32>,
    pub cost_type: CostType,
    pub default_cost: Option<Decimal>,
    pub cost_per_kg: Option<Decimal>,
    #[serde(default)]
    pub overrides: Vec<OverrideSeed>,
}

/// An override naming its location. With `area` it keys an area, otherwise
/// the city.
#[derive(Debug, Deserialize)]
pub struct OverrideSeed {
    pub country: String,
    pub city: String,
    pub area: Option<String>,
    pub cost: Decimal,
}

impl OverrideSeed {
    const fn kind(&self) -> LocationKind {
        if self.area.is_some() {
            LocationKind::Area
        } else {
            LocationKind::City
        }
    }

    fn label(&self) -> String {
        match &self.area {
            Some(area) => format!("{area}, {}, {}", self.city, self.country),
            None => format!("{}, {}", self.city, self.country),
        }
    }
}

impl MethodSeed {
    /// Build a draft from resolved overrides. `fallback_position` applies when
    /// the seed does not set one.
    #[must_use]
    pub fn to_draft(
        &self,
        fallback_position: i32,
        overrides: Vec<StoredOverride>,
    ) -> ShippingMethodDraft {
        ShippingMethodDraft {
            title: self.title.clone(),
            logo: self.logo.clone(),
            enabled: self.enabled,
            position: self.position.unwrap_or(fallback_position),
            cost_type: self.cost_type,
            default_cost: self.default_cost,
            config: StoredConfig {
                cost_per_kg: self.cost_per_kg,
                overrides,
            },
        }
    }
}

const fn enabled_by_default() -> bool {
    true
}

/// Counts of rows written by a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub countries: usize,
    pub cities: usize,
    pub areas: usize,
    pub products: usize,
    pub shipping_methods: usize,
}

/// Parse a seed file without touching the database.
///
/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be read, or
/// `CatalogError::Parse` if it is not a valid catalog.
pub async fn load_file(path: &Path) -> Result<CatalogSeed, CatalogError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CatalogError::Io(format!("Failed to read {}: {e}", path.display())))?;

    Ok(serde_yaml::from_str(&content)?)
}

/// Parse a single shipping method definition, in the same shape as one
/// `shipping_methods` entry of a catalog.
///
/// # Errors
///
/// Returns `CatalogError::Parse` if the YAML does not describe a method.
pub fn parse_method(yaml: &str) -> Result<MethodSeed, CatalogError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Read and parse a single shipping method file.
///
/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be read, or
/// `CatalogError::Parse` if it does not describe a method.
pub async fn load_method_file(path: &Path) -> Result<MethodSeed, CatalogError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CatalogError::Io(format!("Failed to read {}: {e}", path.display())))?;

    parse_method(&content)
}

/// Validate a single method and resolve its override locations against the
/// stored catalog.
///
/// # Errors
///
/// Returns `CatalogError::Invalid` listing every problem, including overrides
/// naming locations that do not exist, or a repository error if a lookup
/// fails.
#[instrument(skip(pool, method), fields(title = %method.title))]
pub async fn resolve_method(
    pool: &PgPool,
    method: &MethodSeed,
    fallback_position: i32,
) -> Result<ShippingMethodDraft, CatalogError> {
    let mut errors = validate_method(method, |_| true);
    if !errors.is_empty() {
        return Err(CatalogError::Invalid(errors));
    }

    let repo = LocationRepository::new(pool);
    let mut overrides = Vec::with_capacity(method.overrides.len());
    for o in &method.overrides {
        let city = repo.resolve_city(&o.city, &o.country).await?;
        let location_id = match (&o.area, city) {
            (Some(area), Some(city)) => repo.resolve_area(area, city).await?.map(|id| id.as_i32()),
            (None, Some(city)) => Some(city.as_i32()),
            (_, None) => None,
        };

        match location_id {
            Some(location_id) => overrides.push(StoredOverride {
                kind: o.kind(),
                location_id,
                cost: o.cost,
            }),
            None => errors.push(format!(
                "Shipping method '{}' overrides unknown location: {}",
                method.title.trim(),
                o.label()
            )),
        }
    }

    if !errors.is_empty() {
        return Err(CatalogError::Invalid(errors));
    }
    Ok(method.to_draft(fallback_position, overrides))
}

/// Validate a catalog, returning every problem found.
#[must_use]
pub fn validate_catalog(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut cities = HashSet::new();
    let mut areas = HashSet::new();

    let mut countries = HashSet::new();
    for country in &seed.countries {
        if country.name.trim().is_empty() {
            errors.push("Country with a blank name".to_string());
        }
        if !countries.insert(country.name.as_str()) {
            errors.push(format!("Duplicate country: {}", country.name));
        }

        for city in &country.cities {
            if city.name.trim().is_empty() {
                errors.push(format!("City with a blank name in {}", country.name));
            }
            if !cities.insert((country.name.as_str(), city.name.as_str())) {
                errors.push(format!("Duplicate city: {}, {}", city.name, country.name));
            }

            for area in &city.areas {
                if area.trim().is_empty() {
                    errors.push(format!(
                        "Area with a blank name in {}, {}",
                        city.name, country.name
                    ));
                }
                if !areas.insert((country.name.as_str(), city.name.as_str(), area.as_str())) {
                    errors.push(format!(
                        "Duplicate area: {area}, {}, {}",
                        city.name, country.name
                    ));
                }
            }
        }
    }

    let mut skus = HashSet::new();
    for product in &seed.products {
        if product.sku.trim().is_empty() {
            errors.push(format!("Product '{}' has a blank sku", product.title));
        }
        if !skus.insert(product.sku.as_str()) {
            errors.push(format!("Duplicate product sku: {}", product.sku));
        }
        if product.weight_kg.is_some_and(|w| w < Decimal::ZERO) {
            errors.push(format!("Negative weight for product: {}", product.sku));
        }
    }

    let mut titles = HashSet::new();
    for method in &seed.shipping_methods {
        let title = method.title.trim();
        if !titles.insert(title) {
            errors.push(format!("Duplicate shipping method: {title}"));
        }

        errors.extend(validate_method(method, |o| match &o.area {
            Some(area) => areas.contains(&(o.country.as_str(), o.city.as_str(), area.as_str())),
            None => cities.contains(&(o.country.as_str(), o.city.as_str())),
        }));
    }

    errors
}

/// Check one method definition. `is_known` reports whether an override's
/// location exists.
#[must_use]
pub fn validate_method(
    method: &MethodSeed,
    is_known: impl Fn(&OverrideSeed) -> bool,
) -> Vec<String> {
    let mut errors = Vec::new();
    let title = method.title.trim();
    if title.is_empty() {
        errors.push("Shipping method with a blank title".to_string());
    }

    match method.cost_type.location_kind() {
        Some(kind) => {
            if method.default_cost.is_none() {
                errors.push(format!(
                    "Shipping method '{title}' needs a default_cost for cost_type {}",
                    method.cost_type
                ));
            }
            if method.cost_per_kg.is_some() {
                errors.push(format!(
                    "Shipping method '{title}' sets cost_per_kg but is priced by {}",
                    method.cost_type
                ));
            }
            for o in &method.overrides {
                if o.kind() != kind {
                    errors.push(format!(
                        "Shipping method '{title}' is priced by {} but overrides {} {}",
                        method.cost_type,
                        o.kind(),
                        o.label()
                    ));
                } else if !is_known(o) {
                    errors.push(format!(
                        "Shipping method '{title}' overrides unknown location: {}",
                        o.label()
                    ));
                }
            }
        }
        None => {
            if !method.overrides.is_empty() {
                errors.push(format!(
                    "Shipping method '{title}' is priced by weight and cannot have overrides"
                ));
            }
        }
    }

    errors
}

/// Validate and seed a parsed catalog inside one transaction.
///
/// # Errors
///
/// Returns `CatalogError::Invalid` with every validation problem, or a
/// database error if any write fails (nothing is committed in that case).
#[instrument(skip_all, fields(
    countries = seed.countries.len(),
    products = seed.products.len(),
    methods = seed.shipping_methods.len()
))]
pub async fn seed_catalog(
    pool: &PgPool,
    seed: &CatalogSeed,
) -> Result<SeedSummary, CatalogError> {
    let errors = validate_catalog(seed);
    if !errors.is_empty() {
        return Err(CatalogError::Invalid(errors));
    }

    let mut summary = SeedSummary::default();
    let mut city_ids: HashMap<(&str, &str), CityId> = HashMap::new();
    let mut area_ids: HashMap<(&str, &str, &str), AreaId> = HashMap::new();

    let mut tx = pool.begin().await?;

    for country in &seed.countries {
        let country_id = locations::upsert_country(&mut tx, &country.name).await?;
        summary.countries += 1;

        for city in &country.cities {
            let city_id = locations::upsert_city(&mut tx, country_id, &city.name).await?;
            city_ids.insert((country.name.as_str(), city.name.as_str()), city_id);
            summary.cities += 1;

            for area in &city.areas {
                let area_id = locations::upsert_area(&mut tx, city_id, area).await?;
                area_ids.insert(
                    (country.name.as_str(), city.name.as_str(), area.as_str()),
                    area_id,
                );
                summary.areas += 1;
            }
        }
    }

    for product in &seed.products {
        products::upsert_weight(&mut tx, &product.sku, &product.title, product.weight_kg).await?;
        summary.products += 1;
    }

    for (index, method) in seed.shipping_methods.iter().enumerate() {
        let overrides = method
            .overrides
            .iter()
            .map(|o| {
                let location_id = match &o.area {
                    Some(area) => area_ids
                        .get(&(o.country.as_str(), o.city.as_str(), area.as_str()))
                        .map(AreaId::as_i32),
                    None => city_ids
                        .get(&(o.country.as_str(), o.city.as_str()))
                        .map(CityId::as_i32),
                };
                location_id
                    .map(|location_id| StoredOverride {
                        kind: o.kind(),
                        location_id,
                        cost: o.cost,
                    })
                    .ok_or_else(|| {
                        CatalogError::Invalid(vec![format!("Unknown location: {}", o.label())])
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let position = i32::try_from(index).unwrap_or(i32::MAX);
        let draft = method.to_draft(position, overrides);

        let id = upsert_by_title(&mut tx, draft).await?;
        debug!(%id, title = %method.title, "Seeded shipping method");
        summary.shipping_methods += 1;
    }

    tx.commit().await?;

    info!(?summary, "Catalog seeded");
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SPRINGFIELD: &str = r"
countries:
  - name: USA
    cities:
      - name: Springfield
        areas: [Evergreen Terrace]
      - name: Shelbyville

products:
  - sku: DONUT-PINK
    title: Pink frosted donut
    weight_kg: 0.25
  - sku: DUFF-6
    title: Duff six-pack

shipping_methods:
  - title: City courier
    cost_type: city
    default_cost: 10
    overrides:
      - { country: USA, city: Springfield, cost: 4 }
  - title: Neighbourhood bike
    cost_type: area
    default_cost: 9
    overrides:
      - { country: USA, city: Springfield, area: Evergreen Terrace, cost: 2 }
  - title: Freight
    cost_type: weight
    cost_per_kg: 2
    enabled: false
";

    fn parse(yaml: &str) -> CatalogSeed {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_seed_file() {
        let seed = parse(SPRINGFIELD);

        assert_eq!(seed.countries[0].cities.len(), 2);
        assert_eq!(seed.products[1].weight_kg, None);
        assert_eq!(seed.shipping_methods[1].cost_type, CostType::Area);
        assert_eq!(
            seed.shipping_methods[1].overrides[0].kind(),
            LocationKind::Area
        );
        assert!(seed.shipping_methods[0].enabled);
        assert!(!seed.shipping_methods[2].enabled);
    }

    #[test]
    fn test_valid_seed_has_no_errors() {
        assert!(validate_catalog(&parse(SPRINGFIELD)).is_empty());
    }

    #[test]
    fn test_unknown_override_location_is_reported() {
        let seed = parse(
            r"
countries:
  - name: USA
    cities:
      - name: Springfield
shipping_methods:
  - title: City courier
    cost_type: city
    default_cost: 10
    overrides:
      - { country: USA, city: Capital City, cost: 4 }
",
        );

        let errors = validate_catalog(&seed);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Capital City"));
    }

    #[test]
    fn test_duplicates_and_negative_weights_are_reported() {
        let seed = parse(
            r"
countries:
  - name: USA
  - name: USA
products:
  - { sku: A, title: One, weight_kg: -1 }
  - { sku: A, title: Two }
",
        );

        let errors = validate_catalog(&seed);

        assert!(errors.iter().any(|e| e == "Duplicate country: USA"));
        assert!(errors.iter().any(|e| e == "Duplicate product sku: A"));
        assert!(errors.iter().any(|e| e == "Negative weight for product: A"));
    }

    #[test]
    fn test_method_shape_must_match_cost_type() {
        let seed = parse(
            r"
countries:
  - name: USA
    cities:
      - name: Springfield
        areas: [Evergreen Terrace]
shipping_methods:
  - title: No default
    cost_type: city
  - title: Wrong kind
    cost_type: city
    default_cost: 5
    overrides:
      - { country: USA, city: Springfield, area: Evergreen Terrace, cost: 1 }
  - title: Heavy
    cost_type: weight
    overrides:
      - { country: USA, city: Springfield, cost: 1 }
",
        );

        let errors = validate_catalog(&seed);

        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("needs a default_cost"));
        assert!(errors[1].contains("overrides area Evergreen Terrace"));
        assert!(errors[2].contains("cannot have overrides"));
    }

    #[test]
    fn test_single_method_file_parses_and_drafts() {
        let method = parse_method(
            r"
title: Evening courier
logo: /logos/evening.svg
cost_type: city
default_cost: 12
overrides:
  - { country: USA, city: Springfield, cost: 5 }
",
        )
        .unwrap();

        assert!(validate_method(&method, |_| true).is_empty());

        let resolved = vec![StoredOverride {
            kind: LocationKind::City,
            location_id: 7,
            cost: Decimal::from(5),
        }];
        let draft = method.to_draft(3, resolved.clone());

        assert_eq!(draft.title, "Evening courier");
        assert!(draft.enabled);
        assert_eq!(draft.position, 3);
        assert_eq!(draft.default_cost, Some(Decimal::from(12)));
        assert_eq!(draft.config.overrides, resolved);
    }

    #[test]
    fn test_single_method_reports_unknown_location() {
        let method = parse_method(
            r"
title: ' '
cost_type: area
default_cost: 3
overrides:
  - { country: USA, city: Springfield, area: Nowhere, cost: 1 }
",
        )
        .unwrap();

        let errors = validate_method(&method, |o| o.area.as_deref() != Some("Nowhere"));

        assert_eq!(
            errors,
            vec![
                "Shipping method with a blank title".to_string(),
                "Shipping method '' overrides unknown location: Nowhere, Springfield, USA"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_method_file_rejects_unknown_cost_type() {
        let result = parse_method("title: Teleport\ncost_type: wormhole\n");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = load_file(Path::new("/nonexistent/catalog.yaml")).await;
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
