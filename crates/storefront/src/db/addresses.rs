//! Address repository.
//!
//! Every write that touches `is_primary` runs in a transaction that locks the
//! owning `shop."user"` row and then clears the user's current primary, so
//! concurrent writes for one user queue up instead of tripping the partial
//! unique index `address_one_primary_per_user`.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, instrument};

use waybill_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

#[derive(Debug, FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    full_name: String,
    street: String,
    apartment: Option<String>,
    area: Option<String>,
    state: Option<String>,
    city: String,
    zip: String,
    country: String,
    is_primary: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            full_name: row.full_name,
            street: row.street,
            apartment: row.apartment,
            area: row.area,
            state: row.state,
            city: row.city,
            zip: row.zip,
            country: row.country,
            is_primary: row.is_primary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const RETURNING: &str = "id, user_id, full_name, street, apartment, area, state, city, zip, \
                         country, is_primary, created_at, updated_at";

/// Repository for address operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an address by id, regardless of owner.
    ///
    /// Callers compare `user_id` themselves so they can tell a missing
    /// address from someone else's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let sql = format!("SELECT {RETURNING} FROM shop.address WHERE id = $1");
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Address::from))
    }

    /// List a user's addresses, primary first, then oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {RETURNING} FROM shop.address WHERE user_id = $1 ORDER BY is_primary DESC, id"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Create an address. A user's first address is always primary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.address WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let is_primary = input.is_primary || existing == 0;
        if is_primary {
            clear_primary(&mut tx, user_id).await?;
        }

        let sql = format!(
            r"
            INSERT INTO shop.address
                (user_id, full_name, street, apartment, area, state, city, zip, country, is_primary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {RETURNING}
            "
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(user_id)
            .bind(&input.full_name)
            .bind(&input.street)
            .bind(&input.apartment)
            .bind(&input.area)
            .bind(&input.state)
            .bind(&input.city)
            .bind(&input.zip)
            .bind(&input.country)
            .bind(is_primary)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(address_id = %row.id, is_primary, "Created address");
        Ok(row.into())
    }

    /// Update an owned address in place.
    ///
    /// `is_primary: true` makes it primary; `false` leaves the flag alone, so
    /// the only way to lose primary status is to promote another address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address, or
    /// `RepositoryError::Database` if the transaction fails.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        lock_owned(&mut tx, user_id, id).await?;
        if input.is_primary {
            clear_primary(&mut tx, user_id).await?;
        }

        let sql = format!(
            r"
            UPDATE shop.address
            SET full_name = $3,
                street = $4,
                apartment = $5,
                area = $6,
                state = $7,
                city = $8,
                zip = $9,
                country = $10,
                is_primary = is_primary OR $11,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {RETURNING}
            "
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&input.full_name)
            .bind(&input.street)
            .bind(&input.apartment)
            .bind(&input.area)
            .bind(&input.state)
            .bind(&input.city)
            .bind(&input.zip)
            .bind(&input.country)
            .bind(input.is_primary)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete an owned, non-primary address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address,
    /// `RepositoryError::Conflict` if it is the primary address, or
    /// `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        if lock_owned(&mut tx, user_id, id).await? {
            return Err(RepositoryError::Conflict(
                "the primary address cannot be deleted".to_owned(),
            ));
        }

        sqlx::query("DELETE FROM shop.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Make an owned address the user's primary, clearing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address, or
    /// `RepositoryError::Database` if the transaction fails.
    #[instrument(skip(self))]
    pub async fn set_primary(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        lock_owned(&mut tx, user_id, id).await?;
        clear_primary(&mut tx, user_id).await?;

        let sql = format!(
            r"
            UPDATE shop.address
            SET is_primary = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {RETURNING}
            "
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(address_id = %id, "Switched primary address");
        Ok(row.into())
    }
}

/// Serialize address writes for one user.
///
/// Every transaction that can move `is_primary` takes this row lock first, so
/// the primary count and the current primary are never read stale.
async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query(r#"SELECT id FROM shop."user" WHERE id = $1 FOR UPDATE"#)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(())
}

/// Lock an owned address row and return its current `is_primary` flag.
async fn lock_owned(
    conn: &mut PgConnection,
    user_id: UserId,
    id: AddressId,
) -> Result<bool, RepositoryError> {
    sqlx::query_scalar(
        "SELECT is_primary FROM shop.address WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

async fn clear_primary(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.address SET is_primary = FALSE, updated_at = NOW() \
         WHERE user_id = $1 AND is_primary",
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}
