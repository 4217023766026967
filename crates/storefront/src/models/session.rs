//! Session-related types.
//!
//! The shopper's server-side session holds what ties the browser to its
//! commerce backend cart.

/// Session keys for cart data.
pub mod keys {
    /// Key for the commerce backend visitor credential.
    pub const COMMERCE_CREDENTIAL: &str = "commerce_credential";

    /// Key for the per-session cart lock identifier.
    pub const CART_KEY: &str = "cart_key";
}
