//! Shipping method inspection and edits.
//!
//! Method files use the shape of one `shipping_methods` entry of a catalog;
//! override locations are looked up by name in the stored catalog.

use std::path::Path;

use tracing::info;

use waybill_core::ShippingMethodId;
use waybill_core::shipping::{CostStrategy, ShippingMethod};
use waybill_storefront::catalog;
use waybill_storefront::db::{RepositoryError, ShippingMethodRepository};

/// Print every stored shipping method in catalog order.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a stored method
/// cannot be parsed.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let methods = ShippingMethodRepository::new(&pool).list_all().await?;

    info!("Shipping methods ({})", methods.len());
    info!("====================");

    for method in &methods {
        describe(method);
    }

    Ok(())
}

/// Create a shipping method from a single-method file.
///
/// Without an explicit `position` the method goes after the last one.
///
/// # Errors
///
/// Returns an error if the file is invalid, names unknown locations, reuses
/// an existing title, or if the database is unreachable.
pub async fn add(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let method = catalog::load_method_file(path).await?;
    let pool = super::connect().await?;
    let repo = ShippingMethodRepository::new(&pool);

    let next_position = repo
        .list_all()
        .await?
        .iter()
        .map(|m| m.position)
        .max()
        .map_or(0, |last| last.saturating_add(1));

    let draft = catalog::resolve_method(&pool, &method, next_position).await?;
    let created = repo.create(draft).await?;

    info!("Created shipping method:");
    describe(&created);
    Ok(())
}

/// Replace a shipping method from a single-method file.
///
/// Without an explicit `position` the method keeps its current one.
///
/// # Errors
///
/// Returns an error if no method has this id, the file is invalid or names
/// unknown locations, or if the database is unreachable.
pub async fn update(
    id: ShippingMethodId,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let method = catalog::load_method_file(path).await?;
    let pool = super::connect().await?;
    let repo = ShippingMethodRepository::new(&pool);

    let current = repo
        .list_all()
        .await?
        .into_iter()
        .find(|m| m.id == id)
        .ok_or(RepositoryError::NotFound)?;

    let draft = catalog::resolve_method(&pool, &method, current.position).await?;
    let updated = repo.update(id, draft).await?;

    info!("Updated shipping method:");
    describe(&updated);
    Ok(())
}

fn describe(method: &ShippingMethod) {
    let status = if method.enabled { "enabled" } else { "disabled" };
    let pricing = match &method.strategy {
        CostStrategy::Weight { cost_per_kg } => format!(
            "weight, {} per kg",
            cost_per_kg.map_or_else(|| "0".to_string(), |rate| rate.to_string())
        ),
        other => format!(
            "{}, default {}, {} overrides",
            other.cost_type(),
            other
                .default_cost()
                .map_or_else(|| "none".to_string(), |cost| cost.to_string()),
            override_count(other)
        ),
    };
    info!(
        "  #{} [{}] {} ({status}): {pricing}",
        method.position, method.id, method.title
    );
}

fn override_count(strategy: &CostStrategy) -> usize {
    match strategy {
        CostStrategy::City { overrides, .. } => overrides.len(),
        CostStrategy::Area { overrides, .. } => overrides.len(),
        CostStrategy::Weight { .. } => 0,
    }
}
