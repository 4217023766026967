//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::CartLocks;
use crate::commerce::{CommerceBackend, HttpCommerceClient};
use crate::config::StorefrontConfig;
use crate::site_config::SiteConfigStore;
use crate::uploads::Uploader;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// storage adapters, the commerce client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    site_config: SiteConfigStore,
    uploader: Uploader,
    catalog: HttpCommerceClient,
    cart_backend: Arc<dyn CommerceBackend>,
    cart_locks: CartLocks,
}

impl AppState {
    /// Build the state from configuration, wiring every adapter to the
    /// services the configuration names.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let site_config = SiteConfigStore::from_config(&config);
        let uploader = Uploader::from_config(&config);
        let catalog = HttpCommerceClient::new(&config.commerce);
        let cart_backend: Arc<dyn CommerceBackend> = Arc::new(catalog.clone());

        Self::from_parts(config, site_config, uploader, catalog, cart_backend)
    }

    /// Build the state from explicit components.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        site_config: SiteConfigStore,
        uploader: Uploader,
        catalog: HttpCommerceClient,
        cart_backend: Arc<dyn CommerceBackend>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                site_config,
                uploader,
                catalog,
                cart_backend,
                cart_locks: CartLocks::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the site configuration store.
    #[must_use]
    pub fn site_config(&self) -> &SiteConfigStore {
        &self.inner.site_config
    }

    /// Get a reference to the upload storage.
    #[must_use]
    pub fn uploader(&self) -> &Uploader {
        &self.inner.uploader
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &HttpCommerceClient {
        &self.inner.catalog
    }

    /// The backend cart operations are sent to.
    #[must_use]
    pub fn cart_backend(&self) -> Arc<dyn CommerceBackend> {
        Arc::clone(&self.inner.cart_backend)
    }

    /// Per-session busy flags.
    #[must_use]
    pub fn cart_locks(&self) -> &CartLocks {
        &self.inner.cart_locks
    }
}
