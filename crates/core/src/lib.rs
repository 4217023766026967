//! Frontières Core - Shared types library.
//!
//! This crate provides the types shared by every Frontières component:
//! - `storefront` - Public storefront and admin API server
//! - `cli` - Command-line tools for inspecting and seeding site configuration
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no filesystem access. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identifiers, quantities and prices
//! - [`site`] - The admin-editable site configuration document
//! - [`cart`] - Backend-authoritative cart snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod site;
pub mod types;

pub use cart::{Cart, CatalogReference, LineItem};
pub use site::{Article, Promo, SiteConfigError, SiteConfiguration, Video};
pub use types::*;
