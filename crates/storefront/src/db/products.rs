//! Product repository. Only the shipping weight is read here.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use waybill_core::ProductId;

use super::RepositoryError;

#[derive(Debug, FromRow)]
struct WeightRow {
    id: ProductId,
    weight_kg: Option<Decimal>,
}

/// Repository for product weight lookups.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Unit weight in kilograms for each of `ids`, fetched in one query.
    ///
    /// Unknown products and products without a recorded weight are absent
    /// from the map and weigh nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn unit_weights(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, WeightRow>(
            r"
            SELECT id, weight_kg
            FROM shop.product
            WHERE id = ANY($1)
            ",
        )
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.weight_kg.map(|weight| (row.id, weight)))
            .collect())
    }
}

/// Set a product's weight by SKU, creating the product if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert_weight(
    conn: &mut sqlx::PgConnection,
    sku: &str,
    title: &str,
    weight_kg: Option<Decimal>,
) -> Result<ProductId, RepositoryError> {
    let id = sqlx::query_scalar(
        r"
        INSERT INTO shop.product (sku, title, weight_kg)
        VALUES ($1, $2, $3)
        ON CONFLICT (sku) DO UPDATE
        SET title = EXCLUDED.title,
            weight_kg = EXCLUDED.weight_kg,
            updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(sku)
    .bind(title)
    .bind(weight_kg)
    .fetch_one(conn)
    .await?;

    Ok(id)
}
