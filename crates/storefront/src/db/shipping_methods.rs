//! Shipping method repository.
//!
//! Rows are parsed into [`ShippingMethod`] on read. A row whose `cost_type` or
//! `config` cannot be parsed is reported as `DataCorruption` rather than
//! silently skipped, so a broken method surfaces instead of vanishing from
//! quotes.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{instrument, warn};

use waybill_core::ShippingMethodId;
use waybill_core::shipping::{
    CostStrategy, MethodConfigError, NormalizedMethod, ShippingMethod, ShippingMethodDraft,
    StoredConfig,
};
use waybill_core::types::CostType;

use super::RepositoryError;

#[derive(Debug, FromRow)]
struct ShippingMethodRow {
    id: ShippingMethodId,
    title: String,
    logo: Option<String>,
    enabled: bool,
    position: i32,
    cost_type: String,
    default_cost: Option<Decimal>,
    config: serde_json::Value,
}

impl TryFrom<ShippingMethodRow> for ShippingMethod {
    type Error = RepositoryError;

    fn try_from(row: ShippingMethodRow) -> Result<Self, Self::Error> {
        let cost_type: CostType = row.cost_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("shipping method {}: {e}", row.id))
        })?;
        let config: StoredConfig = serde_json::from_value(row.config).map_err(|e| {
            RepositoryError::DataCorruption(format!("shipping method {} config: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            logo: row.logo,
            enabled: row.enabled,
            position: row.position,
            strategy: CostStrategy::from_stored(cost_type, row.default_cost, &config),
        })
    }
}

/// Errors raised when writing a shipping method.
#[derive(Debug, thiserror::Error)]
pub enum WriteMethodError {
    #[error(transparent)]
    Invalid(#[from] MethodConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for WriteMethodError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Repository for shipping method operations.
pub struct ShippingMethodRepository<'a> {
    pool: &'a PgPool,
}

const SELECT_COLUMNS: &str = r"
    SELECT id, title, logo, enabled, position, cost_type, default_cost, config
    FROM shop.shipping_method
";

impl<'a> ShippingMethodRepository<'a> {
    /// Create a new shipping method repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All enabled methods in catalog order (`position`, then `id`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a row cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_enabled(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        let sql = format!("{SELECT_COLUMNS} WHERE enabled ORDER BY position, id");
        let rows = sqlx::query_as::<_, ShippingMethodRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(ShippingMethod::try_from).collect()
    }

    /// Every method, enabled or not, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a row cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY position, id");
        let rows = sqlx::query_as::<_, ShippingMethodRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(ShippingMethod::try_from).collect()
    }

    /// Create a method from a draft.
    ///
    /// # Errors
    ///
    /// Returns `WriteMethodError::Invalid` if the draft fails validation, or a
    /// repository error if the insert fails (including a duplicate title).
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(
        &self,
        draft: ShippingMethodDraft,
    ) -> Result<ShippingMethod, WriteMethodError> {
        let method = normalize_logged(draft)?;
        let (default_cost, config) = method.strategy.to_stored();
        let config = stored_json(&config)?;

        let row = sqlx::query_as::<_, ShippingMethodRow>(
            r"
            INSERT INTO shop.shipping_method
                (title, logo, enabled, position, cost_type, default_cost, config)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, logo, enabled, position, cost_type, default_cost, config
            ",
        )
        .bind(&method.title)
        .bind(&method.logo)
        .bind(method.enabled)
        .bind(method.position)
        .bind(method.strategy.cost_type().as_str())
        .bind(default_cost)
        .bind(config)
        .fetch_one(self.pool)
        .await
        .map_err(|e| unique_title_conflict(e, &method.title))?;

        Ok(ShippingMethod::try_from(row)?)
    }

    /// Replace a method's definition.
    ///
    /// # Errors
    ///
    /// Returns `WriteMethodError::Invalid` if the draft fails validation,
    /// `RepositoryError::NotFound` if no method has this id, or a repository
    /// error if the update fails.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn update(
        &self,
        id: ShippingMethodId,
        draft: ShippingMethodDraft,
    ) -> Result<ShippingMethod, WriteMethodError> {
        let method = normalize_logged(draft)?;
        let (default_cost, config) = method.strategy.to_stored();
        let config = stored_json(&config)?;

        let row = sqlx::query_as::<_, ShippingMethodRow>(
            r"
            UPDATE shop.shipping_method
            SET title = $2,
                logo = $3,
                enabled = $4,
                position = $5,
                cost_type = $6,
                default_cost = $7,
                config = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, logo, enabled, position, cost_type, default_cost, config
            ",
        )
        .bind(id)
        .bind(&method.title)
        .bind(&method.logo)
        .bind(method.enabled)
        .bind(method.position)
        .bind(method.strategy.cost_type().as_str())
        .bind(default_cost)
        .bind(config)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| unique_title_conflict(e, &method.title))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(ShippingMethod::try_from(row)?)
    }
}

/// Insert or replace a method keyed by title, on the caller's connection.
///
/// # Errors
///
/// Returns `WriteMethodError::Invalid` if the draft fails validation, or a
/// repository error if the upsert fails.
pub async fn upsert_by_title(
    conn: &mut sqlx::PgConnection,
    draft: ShippingMethodDraft,
) -> Result<ShippingMethodId, WriteMethodError> {
    let method = normalize_logged(draft)?;
    let (default_cost, config) = method.strategy.to_stored();
    let config = stored_json(&config)?;

    let id = sqlx::query_scalar(
        r"
        INSERT INTO shop.shipping_method
            (title, logo, enabled, position, cost_type, default_cost, config)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (title) DO UPDATE
        SET logo = EXCLUDED.logo,
            enabled = EXCLUDED.enabled,
            position = EXCLUDED.position,
            cost_type = EXCLUDED.cost_type,
            default_cost = EXCLUDED.default_cost,
            config = EXCLUDED.config,
            updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(&method.title)
    .bind(&method.logo)
    .bind(method.enabled)
    .bind(method.position)
    .bind(method.strategy.cost_type().as_str())
    .bind(default_cost)
    .bind(config)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

fn normalize_logged(draft: ShippingMethodDraft) -> Result<NormalizedMethod, MethodConfigError> {
    let method = draft.normalize()?;
    if method.dropped_overrides > 0 {
        warn!(
            title = %method.title,
            cost_type = %method.strategy.cost_type(),
            dropped = method.dropped_overrides,
            "Dropping overrides that do not match the method's cost type"
        );
    }
    Ok(method)
}

fn stored_json(config: &StoredConfig) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(config)
        .map_err(|e| RepositoryError::DataCorruption(format!("cannot encode config: {e}")))
}

fn unique_title_conflict(e: sqlx::Error, title: &str) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("shipping method '{title}' already exists"))
        }
        _ => RepositoryError::Database(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use waybill_core::{AreaId, CityId};

    fn row(
        cost_type: &str,
        default_cost: Option<&str>,
        config: serde_json::Value,
    ) -> ShippingMethodRow {
        ShippingMethodRow {
            id: ShippingMethodId::new(1),
            title: "Courier".to_owned(),
            logo: None,
            enabled: true,
            position: 0,
            cost_type: cost_type.to_owned(),
            default_cost: default_cost.map(|c| c.parse().unwrap()),
            config,
        }
    }

    #[test]
    fn test_row_parses_city_overrides() {
        let method = ShippingMethod::try_from(row(
            "city",
            Some("10"),
            serde_json::json!({"overrides": [
                {"type": "city", "locationId": 7, "cost": "4"},
                {"type": "area", "locationId": 9, "cost": "1"}
            ]}),
        ))
        .unwrap();

        match method.strategy {
            CostStrategy::City { overrides, .. } => {
                assert_eq!(overrides.len(), 1);
                assert_eq!(overrides[0].location_id, CityId::new(7));
            }
            other => panic!("expected city strategy, got {other:?}"),
        }
    }

    #[test]
    fn test_row_parses_area_overrides_only() {
        let method = ShippingMethod::try_from(row(
            "area",
            Some("5"),
            serde_json::json!({"overrides": [{"type": "area", "locationId": 3, "cost": 2}]}),
        ))
        .unwrap();

        match method.strategy {
            CostStrategy::Area { overrides, .. } => {
                assert_eq!(overrides[0].location_id, AreaId::new(3));
            }
            other => panic!("expected area strategy, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_cost_type_is_corruption() {
        let result = ShippingMethod::try_from(row("zone", Some("1"), serde_json::json!({})));
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[test]
    fn test_malformed_config_is_corruption() {
        let result = ShippingMethod::try_from(row(
            "weight",
            None,
            serde_json::json!({"cost_per_kg": "not a number"}),
        ));
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[test]
    fn test_weight_row_reads_rate() {
        let method = ShippingMethod::try_from(row(
            "weight",
            None,
            serde_json::json!({"cost_per_kg": 1.5}),
        ))
        .unwrap();

        assert_eq!(
            method.strategy,
            CostStrategy::Weight {
                cost_per_kg: Some("1.5".parse().unwrap())
            }
        );
    }
}
