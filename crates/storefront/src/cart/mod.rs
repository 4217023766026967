//! Shopper cart session.
//!
//! The commerce backend owns the cart. [`CartSessionManager`] mirrors it for
//! one shopper session:
//!
//! - every mutation is a single backend round-trip whose response replaces
//!   the local snapshot wholesale
//! - a failed or timed-out round-trip leaves the snapshot untouched
//! - the visitor credential is persisted whenever the backend issued a new
//!   one
//! - mutations are serialized per session by a busy flag; overlapping
//!   attempts are rejected with [`CartError::Busy`]
//!
//! State transitions:
//!
//! ```text
//! Uninitialized --hydrate--> Hydrated(cart) | Empty
//! any           --mutation ok--> Hydrated(cart)   (zero lines allowed)
//! ```

pub mod busy;
pub mod credentials;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use frontieres_core::{Cart, CatalogReference, LineItemId, Quantity};
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

use crate::commerce::{
    Authorized, CheckoutCallbacks, CommerceBackend, CommerceError, LineItemInput,
    SessionCredential,
};

pub use busy::{BusyFlag, BusyGuard, CartLocks};
pub use credentials::{CredentialStore, CredentialStoreError, MemoryCredentialStore};

/// Cart operation errors.
#[derive(Debug, Error)]
pub enum CartError {
    /// Another mutation for this session is in flight.
    #[error("another cart operation is in progress")]
    Busy,

    /// Checkout needs at least one line.
    #[error("cart is empty")]
    EmptyCart,

    #[error("commerce backend is not configured")]
    NotConfigured,

    /// The round-trip did not complete in time. Its outcome is unknown.
    #[error("cart operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("commerce backend error: {0}")]
    Backend(CommerceError),
}

impl From<CommerceError> for CartError {
    fn from(err: CommerceError) -> Self {
        match err {
            CommerceError::NotConfigured => Self::NotConfigured,
            other => Self::Backend(other),
        }
    }
}

/// Local view of the shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CartState {
    /// Not fetched yet.
    #[default]
    Uninitialized,
    /// The shopper has no cart, or it could not be fetched.
    Empty,
    Hydrated(Cart),
}

impl CartState {
    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        match self {
            Self::Hydrated(cart) => Some(cart),
            Self::Uninitialized | Self::Empty => None,
        }
    }
}

/// Cart session for one shopper.
pub struct CartSessionManager {
    backend: Arc<dyn CommerceBackend>,
    credentials: Arc<dyn CredentialStore>,
    busy: BusyFlag,
    timeout: Duration,
    state: watch::Sender<CartState>,
}

impl CartSessionManager {
    #[must_use]
    pub fn new(
        backend: Arc<dyn CommerceBackend>,
        credentials: Arc<dyn CredentialStore>,
        busy: BusyFlag,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            credentials,
            busy,
            timeout,
            state: watch::Sender::new(CartState::Uninitialized),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Receive every snapshot replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Whether a mutation is in flight for this session.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Fetch the current cart.
    ///
    /// Never fails: a missing cart and a failed fetch both yield
    /// [`CartState::Empty`], the latter logged.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> CartState {
        let loaded = self.load_credential().await;
        let result = self
            .bounded(self.backend.current_cart(loaded.clone()))
            .await;

        let state = match result {
            Ok(authorized) => {
                self.persist_if_rotated(loaded.as_ref(), &authorized.credential)
                    .await;
                authorized
                    .data
                    .map_or(CartState::Empty, CartState::Hydrated)
            }
            Err(e) => {
                tracing::info!(error = %e, "No active cart found or cart fetch failed");
                CartState::Empty
            }
        };

        self.state.send_replace(state.clone());
        state
    }

    /// Add a product. The quantity is clamped to at least one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Busy`] while another mutation is in flight, or the
    /// backend failure. The snapshot is unchanged on error.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_item(
        &self,
        product: CatalogReference,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let items = vec![LineItemInput {
            product,
            quantity: Quantity::clamped(quantity),
        }];
        self.mutate(|credential| self.backend.add_to_current_cart(credential, items))
            .await
    }

    /// Remove a line. Removing the last line leaves a hydrated, zero-line cart.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_item`].
    #[instrument(skip(self, line_id), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: LineItemId) -> Result<Cart, CartError> {
        self.mutate(|credential| self.backend.remove_line_items(credential, vec![line_id]))
            .await
    }

    /// Set a line's quantity, clamped to at least one.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_item`].
    #[instrument(skip(self, line_id), fields(line_id = %line_id))]
    pub async fn update_quantity(
        &self,
        line_id: LineItemId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let quantity = Quantity::clamped(quantity);
        self.mutate(|credential| {
            self.backend
                .update_line_item_quantity(credential, line_id, quantity)
        })
        .await
    }

    /// Create a hosted checkout session for the current cart and return the
    /// redirect URL. Hydrates first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EmptyCart`] without a non-empty cart, or the
    /// backend failure.
    #[instrument(skip(self, callbacks))]
    pub async fn checkout(&self, callbacks: &CheckoutCallbacks) -> Result<String, CartError> {
        let state = match self.state() {
            CartState::Uninitialized => self.hydrate().await,
            state => state,
        };

        let cart = match state {
            CartState::Hydrated(cart) if !cart.is_empty() => cart,
            _ => return Err(CartError::EmptyCart),
        };

        let loaded = self.load_credential().await;
        let authorized = self
            .bounded(
                self.backend
                    .create_checkout_redirect(loaded.clone(), &cart.id, callbacks),
            )
            .await?;
        self.persist_if_rotated(loaded.as_ref(), &authorized.credential)
            .await;

        tracing::info!(cart_id = %cart.id, "Checkout session created");
        Ok(authorized.data)
    }

    /// Run one mutation round-trip under the busy flag.
    async fn mutate<F, Fut>(&self, call: F) -> Result<Cart, CartError>
    where
        F: FnOnce(Option<SessionCredential>) -> Fut,
        Fut: Future<Output = Result<Authorized<Cart>, CommerceError>>,
    {
        let _guard = self.busy.try_acquire().ok_or(CartError::Busy)?;

        let loaded = self.load_credential().await;
        let authorized = self.bounded(call(loaded.clone())).await?;

        self.persist_if_rotated(loaded.as_ref(), &authorized.credential)
            .await;
        self.state
            .send_replace(CartState::Hydrated(authorized.data.clone()));

        Ok(authorized.data)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, CommerceError>>,
    ) -> Result<T, CartError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(CartError::from),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Cart round-trip timed out");
                Err(CartError::Timeout(self.timeout))
            }
        }
    }

    async fn load_credential(&self) -> Option<SessionCredential> {
        match self.credentials.load_credential().await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load visitor credential");
                None
            }
        }
    }

    async fn persist_if_rotated(
        &self,
        loaded: Option<&SessionCredential>,
        current: &SessionCredential,
    ) {
        if loaded == Some(current) {
            return;
        }
        if let Err(e) = self.credentials.save_credential(current).await {
            tracing::warn!(error = %e, "Failed to persist visitor credential");
        }
    }
}
