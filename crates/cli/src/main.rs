//! Waybill CLI - Database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! waybill-cli migrate
//!
//! # Validate a catalog file without writing anything
//! waybill-cli seed --check catalog.yaml
//!
//! # Seed locations, product weights and shipping methods
//! waybill-cli seed catalog.yaml
//!
//! # Show the stored shipping methods
//! waybill-cli shipping list
//!
//! # Add a method, or replace method 3, from a single-method YAML file
//! waybill-cli shipping add evening-courier.yaml
//! waybill-cli shipping update 3 evening-courier.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `WAYBILL_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use waybill_core::ShippingMethodId;

mod commands;

#[derive(Parser)]
#[command(name = "waybill-cli")]
#[command(author, version, about = "Waybill CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the catalog file
        file: PathBuf,

        /// Only parse and validate the file
        #[arg(long)]
        check: bool,
    },
    /// Inspect and edit shipping methods
    Shipping {
        #[command(subcommand)]
        action: ShippingAction,
    },
}

#[derive(Subcommand)]
enum ShippingAction {
    /// List every shipping method in catalog order
    List,
    /// Add a method from a YAML file, placed after the existing ones
    Add {
        /// Path to the method file
        file: PathBuf,
    },
    /// Replace a method's definition from a YAML file
    Update {
        /// Shipping method id
        id: i32,

        /// Path to the method file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, check } => commands::seed::catalog(&file, check).await?,
        Commands::Shipping { action } => match action {
            ShippingAction::List => commands::shipping::list().await?,
            ShippingAction::Add { file } => commands::shipping::add(&file).await?,
            ShippingAction::Update { id, file } => {
                commands::shipping::update(ShippingMethodId::new(id), &file).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_update_parses_id_and_file() {
        let cli =
            Cli::try_parse_from(["waybill-cli", "shipping", "update", "3", "m.yaml"]).unwrap();

        match cli.command {
            Commands::Shipping {
                action: ShippingAction::Update { id, file },
            } => {
                assert_eq!(id, 3);
                assert_eq!(file, PathBuf::from("m.yaml"));
            }
            _ => panic!("expected shipping update"),
        }
    }

    #[test]
    fn test_shipping_add_requires_file() {
        assert!(Cli::try_parse_from(["waybill-cli", "shipping", "add"]).is_err());
    }
}
