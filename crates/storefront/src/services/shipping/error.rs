//! Shipping quote error types.

use thiserror::Error;

use waybill_core::AddressId;

use crate::db::RepositoryError;

/// Errors that can occur while quoting shipping.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// No address has this id.
    #[error("address {0} not found")]
    AddressNotFound(AddressId),

    /// The address belongs to another user.
    #[error("address {0} does not belong to the requesting user")]
    Forbidden(AddressId),

    /// A lookup failed while composing the quote. No partial list is returned.
    #[error("shipping calculation failed: {0}")]
    CalculationFailed(#[source] RepositoryError),
}
