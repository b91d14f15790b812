//! Waybill storefront library.
//!
//! Shipping quotes and the address book as a JSON API, plus catalog seeding
//! used by the CLI. Exposed as a library so it can be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
