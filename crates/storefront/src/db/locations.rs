//! Location repository: canonical countries, cities and areas.
//!
//! Names are matched exactly (case-sensitive) within their parent scope.

use sqlx::PgPool;
use tracing::instrument;

use waybill_core::{AreaId, CityId, CountryId};

use super::RepositoryError;

/// Repository for location lookups and catalog upserts.
pub struct LocationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LocationRepository<'a> {
    /// Create a new location repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a city by name within a country (also matched by name).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn resolve_city(
        &self,
        name: &str,
        country: &str,
    ) -> Result<Option<CityId>, RepositoryError> {
        let id: Option<CityId> = sqlx::query_scalar(
            r"
            SELECT c.id
            FROM shop.city c
            JOIN shop.country co ON co.id = c.country_id
            WHERE c.name = $1 AND co.name = $2
            ",
        )
        .bind(name)
        .bind(country)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }

    /// Resolve an area by name within a city.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn resolve_area(
        &self,
        name: &str,
        city_id: CityId,
    ) -> Result<Option<AreaId>, RepositoryError> {
        let id: Option<AreaId> = sqlx::query_scalar(
            r"
            SELECT id
            FROM shop.area
            WHERE name = $1 AND city_id = $2
            ",
        )
        .bind(name)
        .bind(city_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }
}

/// Insert a country if missing and return its id.
///
/// Runs on the caller's connection so catalog seeding stays in one transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert_country(
    conn: &mut sqlx::PgConnection,
    name: &str,
) -> Result<CountryId, RepositoryError> {
    let id = sqlx::query_scalar(
        r"
        INSERT INTO shop.country (name)
        VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        ",
    )
    .bind(name)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Insert a city if missing and return its id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert_city(
    conn: &mut sqlx::PgConnection,
    country_id: CountryId,
    name: &str,
) -> Result<CityId, RepositoryError> {
    let id = sqlx::query_scalar(
        r"
        INSERT INTO shop.city (country_id, name)
        VALUES ($1, $2)
        ON CONFLICT (country_id, name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        ",
    )
    .bind(country_id)
    .bind(name)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Insert an area if missing and return its id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert_area(
    conn: &mut sqlx::PgConnection,
    city_id: CityId,
    name: &str,
) -> Result<AreaId, RepositoryError> {
    let id = sqlx::query_scalar(
        r"
        INSERT INTO shop.area (city_id, name)
        VALUES ($1, $2)
        ON CONFLICT (city_id, name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        ",
    )
    .bind(city_id)
    .bind(name)
    .fetch_one(conn)
    .await?;

    Ok(id)
}
