//! Seed the catalog from a YAML file.
//!
//! The file is parsed and validated before any connection is opened; all
//! writes then happen in a single transaction.

use std::path::Path;

use tracing::{error, info};

use waybill_storefront::catalog::{self, CatalogError};

/// Validate and optionally seed a catalog file.
///
/// # Arguments
///
/// * `path` - Path to the YAML catalog
/// * `check_only` - Stop after validation
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails validation, or if any
/// database operation fails.
pub async fn catalog(path: &Path, check_only: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading catalog");
    let seed = catalog::load_file(path).await?;

    info!(
        countries = seed.countries.len(),
        products = seed.products.len(),
        shipping_methods = seed.shipping_methods.len(),
        "Parsed catalog"
    );

    let errors = catalog::validate_catalog(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CatalogError::Invalid(errors).into());
    }

    info!("Catalog validated successfully");
    if check_only {
        return Ok(());
    }

    let pool = super::connect().await?;
    let summary = catalog::seed_catalog(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Countries: {}", summary.countries);
    info!("  Cities: {}", summary.cities);
    info!("  Areas: {}", summary.areas);
    info!("  Products: {}", summary.products);
    info!("  Shipping methods: {}", summary.shipping_methods);

    Ok(())
}
