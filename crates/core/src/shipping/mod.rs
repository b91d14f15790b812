//! Shipping cost rules.
//!
//! Everything here is pure: the storefront loads a snapshot (address locations,
//! product weights, enabled methods) and hands it to these functions.
//!
//! - [`method`] - Shipping methods, the tagged cost strategy, and the stored
//!   JSON config it is read from and written to
//! - [`weight`] - Cart weight aggregation
//! - [`quote`] - Per-method pricing and the filtered quote list

pub mod method;
pub mod quote;
pub mod weight;

pub use method::{
    CostStrategy, LocationOverride, MethodConfigError, NormalizedMethod, ShippingMethod,
    ShippingMethodDraft, StoredConfig, StoredOverride,
};
pub use quote::{ResolvedLocation, ShippingQuote, quote_methods};
pub use weight::{CartLine, distinct_products, total_weight};
