//! Commerce backend client.
//!
//! # Architecture
//!
//! - The commerce backend is the source of truth for catalog, cart and
//!   checkout. No local sync, direct REST calls.
//! - Cart operations go through the [`CommerceBackend`] trait so the cart
//!   session manager can be driven by a fake in tests.
//! - Catalog responses are cached in memory via `moka` (5 minute TTL).
//!
//! # Authentication
//!
//! Shoppers are anonymous visitors. Each cart call takes the shopper's
//! [`SessionCredential`] (if any) and returns the credential that was
//! actually used, which may be freshly issued or refreshed. Callers persist
//! the returned credential.

mod auth;
mod cache;
mod client;
pub mod types;

pub use auth::SessionCredential;
pub use client::HttpCommerceClient;
pub use types::{Collection, Product, ProductPrice, normalize_image_url};

use async_trait::async_trait;
use frontieres_core::{Cart, CartId, CatalogReference, CollectionId, LineItemId, Quantity};
use thiserror::Error;

/// Default number of products per catalog query.
pub const DEFAULT_PRODUCT_LIMIT: u32 = 20;

/// Largest accepted catalog page.
pub const MAX_PRODUCT_LIMIT: u32 = 100;

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// No client id is configured.
    #[error("commerce backend is not configured")]
    NotConfigured,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response parsed but is missing required data.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// A backend result together with the credential it was obtained with.
#[derive(Debug, Clone)]
pub struct Authorized<T> {
    pub data: T,
    pub credential: SessionCredential,
}

/// A line to add to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemInput {
    pub product: CatalogReference,
    pub quantity: Quantity,
}

/// Where the hosted checkout sends the shopper afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCallbacks {
    pub post_flow_url: String,
    pub thank_you_page_url: String,
}

impl CheckoutCallbacks {
    /// Both callbacks pointing at `<base_url>/success`.
    #[must_use]
    pub fn success_page(base_url: &str) -> Self {
        let url = format!("{}/success", base_url.trim_end_matches('/'));
        Self {
            post_flow_url: url.clone(),
            thank_you_page_url: url,
        }
    }
}

/// Catalog product query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    /// Restrict to products in this collection.
    pub collection: Option<CollectionId>,
    /// Page size, newest first.
    pub limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            collection: None,
            limit: DEFAULT_PRODUCT_LIMIT,
        }
    }
}

impl ProductQuery {
    #[must_use]
    pub fn new(collection: Option<CollectionId>, limit: Option<u32>) -> Self {
        Self {
            collection: collection.filter(|id| !id.is_blank()),
            limit: limit
                .unwrap_or(DEFAULT_PRODUCT_LIMIT)
                .clamp(1, MAX_PRODUCT_LIMIT),
        }
    }
}

/// The shopper's cart as held by the commerce backend.
///
/// Every method resolves the shopper's "current cart" from the credential.
/// A missing or expired credential is replaced, and the replacement is
/// returned in [`Authorized::credential`].
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// The current cart, `None` if the shopper has none yet.
    async fn current_cart(
        &self,
        credential: Option<SessionCredential>,
    ) -> Result<Authorized<Option<Cart>>, CommerceError>;

    /// Append lines, creating the cart if needed.
    async fn add_to_current_cart(
        &self,
        credential: Option<SessionCredential>,
        items: Vec<LineItemInput>,
    ) -> Result<Authorized<Cart>, CommerceError>;

    /// Delete lines.
    async fn remove_line_items(
        &self,
        credential: Option<SessionCredential>,
        line_ids: Vec<LineItemId>,
    ) -> Result<Authorized<Cart>, CommerceError>;

    /// Set one line's quantity.
    async fn update_line_item_quantity(
        &self,
        credential: Option<SessionCredential>,
        line_id: LineItemId,
        quantity: Quantity,
    ) -> Result<Authorized<Cart>, CommerceError>;

    /// Create a hosted checkout session and return its full redirect URL.
    async fn create_checkout_redirect(
        &self,
        credential: Option<SessionCredential>,
        cart_id: &CartId,
        callbacks: &CheckoutCallbacks,
    ) -> Result<Authorized<String>, CommerceError>;
}
