//! Address book handlers.
//!
//! All routes act on the caller's own addresses; another user's address is
//! indistinguishable from a missing one here.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::instrument;

use waybill_core::AddressId;

use crate::db::AddressRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressInput};
use crate::state::AppState;

fn validated(
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> Result<AddressInput> {
    let Json(input) = payload?;
    input.normalize().map_err(|missing| {
        AppError::Validation(format!("required fields are blank: {}", missing.join(", ")))
    })
}

/// List the caller's addresses, primary first.
///
/// # Errors
///
/// Returns 401 without a session identity, 500 if the query fails.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(addresses))
}

/// Create an address. The first one becomes primary.
///
/// # Errors
///
/// Returns 400 for blank required fields, 500 if the insert fails.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Address>)> {
    let input = validated(payload)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// Update an address in place.
///
/// # Errors
///
/// Returns 400 for blank required fields, 404 if the caller has no such
/// address, 500 if the update fails.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> Result<Json<Address>> {
    let input = validated(payload)?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;
    Ok(Json(address))
}

/// Delete a non-primary address.
///
/// # Errors
///
/// Returns 404 if the caller has no such address, 409 if it is the primary.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make an address the caller's primary.
///
/// # Errors
///
/// Returns 404 if the caller has no such address, 500 if the switch fails
/// (the previous primary is kept).
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn set_primary(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .set_primary(user.id, id)
        .await?;
    Ok(Json(address))
}
