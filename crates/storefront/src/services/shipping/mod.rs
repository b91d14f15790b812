//! Shipping quote orchestration.
//!
//! Loads the destination address and checks ownership, then issues the
//! remaining reads concurrently: location resolution, cart weights and the
//! enabled method catalog. Pricing itself is the pure
//! [`waybill_core::shipping::quote_methods`].
//!
//! Local defaults never abort a quote: an unresolved city or area falls back
//! to default costs, a product without a weight weighs nothing. Any failed
//! read aborts the whole quote.

mod error;

pub use error::ShippingError;

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use waybill_core::shipping::{
    CartLine, ResolvedLocation, ShippingMethod, ShippingQuote, distinct_products, quote_methods,
    total_weight,
};
use waybill_core::{AddressId, AreaId, CityId, ProductId, UserId};

use crate::db::{
    AddressRepository, LocationRepository, ProductRepository, RepositoryError,
    ShippingMethodRepository,
};
use crate::models::Address;

/// Reads the calculator depends on.
#[async_trait]
pub trait ShippingData: Send + Sync {
    /// Address by id, regardless of owner.
    async fn address(&self, id: AddressId) -> Result<Option<Address>, RepositoryError>;

    /// City by exact name within a country.
    async fn resolve_city(
        &self,
        name: &str,
        country: &str,
    ) -> Result<Option<CityId>, RepositoryError>;

    /// Area by exact name within a city.
    async fn resolve_area(
        &self,
        name: &str,
        city_id: CityId,
    ) -> Result<Option<AreaId>, RepositoryError>;

    /// Known unit weights for `ids`.
    async fn unit_weights(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError>;

    /// Enabled methods in catalog order.
    async fn enabled_methods(&self) -> Result<Vec<ShippingMethod>, RepositoryError>;
}

/// `PostgreSQL`-backed [`ShippingData`].
pub struct PgShippingData<'a> {
    pool: &'a PgPool,
}

impl<'a> PgShippingData<'a> {
    /// Create a new data source over `pool`.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShippingData for PgShippingData<'_> {
    async fn address(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        AddressRepository::new(self.pool).get_by_id(id).await
    }

    async fn resolve_city(
        &self,
        name: &str,
        country: &str,
    ) -> Result<Option<CityId>, RepositoryError> {
        LocationRepository::new(self.pool)
            .resolve_city(name, country)
            .await
    }

    async fn resolve_area(
        &self,
        name: &str,
        city_id: CityId,
    ) -> Result<Option<AreaId>, RepositoryError> {
        LocationRepository::new(self.pool)
            .resolve_area(name, city_id)
            .await
    }

    async fn unit_weights(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, RepositoryError> {
        ProductRepository::new(self.pool).unit_weights(ids).await
    }

    async fn enabled_methods(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        ShippingMethodRepository::new(self.pool).list_enabled().await
    }
}

/// Computes the applicable shipping options for an address and cart.
pub struct ShippingCalculator<D> {
    data: D,
}

impl<'a> ShippingCalculator<PgShippingData<'a>> {
    /// Create a calculator backed by `PostgreSQL`.
    #[must_use]
    pub const fn postgres(pool: &'a PgPool) -> Self {
        Self::new(PgShippingData::new(pool))
    }
}

impl<D: ShippingData> ShippingCalculator<D> {
    /// Create a calculator over any data source.
    #[must_use]
    pub const fn new(data: D) -> Self {
        Self { data }
    }

    /// Quote every applicable enabled method, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::AddressNotFound` if the address does not exist,
    /// `ShippingError::Forbidden` if it belongs to someone other than
    /// `user_id`, or `ShippingError::CalculationFailed` if any read fails.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn quote(
        &self,
        user_id: UserId,
        address_id: AddressId,
        lines: &[CartLine],
    ) -> Result<Vec<ShippingQuote>, ShippingError> {
        let address = self
            .data
            .address(address_id)
            .await
            .map_err(ShippingError::CalculationFailed)?
            .ok_or(ShippingError::AddressNotFound(address_id))?;

        if address.user_id != user_id {
            return Err(ShippingError::Forbidden(address_id));
        }

        let products = distinct_products(lines);
        let (location, weights, methods) = tokio::try_join!(
            self.resolve_location(&address),
            self.data.unit_weights(&products),
            self.data.enabled_methods(),
        )
        .map_err(ShippingError::CalculationFailed)?;

        let weight = total_weight(lines, &weights);
        let quotes = quote_methods(&methods, location, weight);

        debug!(
            city_id = ?location.city,
            area_id = ?location.area,
            total_weight = ?weight,
            methods = methods.len(),
            quotes = quotes.len(),
            "Computed shipping quotes"
        );

        Ok(quotes)
    }

    /// Resolve the address's city, then its area within that city.
    ///
    /// An area can only be resolved once the city is known.
    async fn resolve_location(
        &self,
        address: &Address,
    ) -> Result<ResolvedLocation, RepositoryError> {
        let city = self
            .data
            .resolve_city(&address.city, &address.country)
            .await?;

        let area = match (city, address.area.as_deref()) {
            (Some(city_id), Some(name)) => self.data.resolve_area(name, city_id).await?,
            _ => None,
        };

        Ok(ResolvedLocation { city, area })
    }
}
