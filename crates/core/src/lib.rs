//! Waybill Core - Shipping domain library.
//!
//! This crate provides the types and pricing rules shared by all Waybill
//! components:
//! - `storefront` - HTTP service answering shipping quotes and managing addresses
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything the shipping calculator decides (which overrides
//! apply, how weight is summed, which methods survive) lives here so it can be
//! tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs and the cost/location enums
//! - [`shipping`] - Cost strategies, override matching, weight aggregation, quotes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod shipping;
pub mod types;

pub use types::*;
