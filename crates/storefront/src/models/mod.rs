//! Domain models for storefront.

pub mod address;
pub mod session;

pub use address::{Address, AddressInput};
pub use session::{CurrentUser, keys as session_keys};
