//! Domain models for storefront sessions.

pub mod session;
