//! Frontières Storefront library.
//!
//! This crate provides the storefront and admin API as a library, allowing
//! it to be tested and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod commerce;
pub mod config;
pub mod error;
pub mod fallback;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod site_config;
pub mod state;
pub mod uploads;
