//! Business logic services for storefront.
//!
//! # Services
//!
//! - `shipping` - Shipping quotes for an address and cart

pub mod shipping;

pub use shipping::{ShippingCalculator, ShippingError};
