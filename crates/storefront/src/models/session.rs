//! Session-related types.
//!
//! The external authentication service writes these into the shared
//! `PostgreSQL` session store; the storefront only reads them.

use serde::{Deserialize, Serialize};

use waybill_core::UserId;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
