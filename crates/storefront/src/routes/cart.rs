//! Cart route handlers.
//!
//! Each request builds a [`CartSessionManager`] over the shopper's session.
//! The visitor credential lives in the session; the busy flag is shared by
//! every request carrying the same session, so a second mutation sent while
//! one is in flight gets `409`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use frontieres_core::{Cart, CatalogReference, LineItemId, ProductId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::cart::{CartSessionManager, CartState};
use crate::commerce::CheckoutCallbacks;
use crate::error::{AppError, Result};
use crate::models::session::keys;
use crate::state::AppState;

/// Cart as returned to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    /// `None` when the shopper has no cart.
    pub cart: Option<Cart>,
    pub item_count: u32,
    pub subtotal: Option<String>,
}

impl CartView {
    fn from_cart(cart: Cart) -> Self {
        Self {
            item_count: cart.item_count(),
            subtotal: Some(cart.display_subtotal()),
            cart: Some(cart),
        }
    }
}

impl From<CartState> for CartView {
    fn from(state: CartState) -> Self {
        match state {
            CartState::Hydrated(cart) => Self::from_cart(cart),
            CartState::Uninitialized | CartState::Empty => Self {
                cart: None,
                item_count: 0,
                subtotal: None,
            },
        }
    }
}

const fn default_quantity() -> i64 {
    1
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Selected product options (e.g. size), by option name.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub line_item_id: LineItemId,
    pub quantity: i64,
}

/// Remove line request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub line_item_id: LineItemId,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the session's cart lock key, creating it on first use.
async fn cart_key(session: &Session) -> Result<String> {
    if let Some(key) = session
        .get::<String>(keys::CART_KEY)
        .await
        .ok()
        .flatten()
    {
        return Ok(key);
    }

    let key = Uuid::new_v4().to_string();
    session
        .insert(keys::CART_KEY, &key)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
    Ok(key)
}

/// Build the cart manager for this session.
async fn manager(state: &AppState, session: Session) -> Result<CartSessionManager> {
    let key = cart_key(&session).await?;
    let busy = state.cart_locks().flag(&key).await;

    Ok(CartSessionManager::new(
        state.cart_backend(),
        Arc::new(session),
        busy,
        state.config().commerce.cart_timeout,
    ))
}

fn require_id(blank: bool, field: &str) -> Result<()> {
    if blank {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart. Never fails on backend errors: an unreachable backend shows
/// as no cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let manager = manager(&state, session).await?;
    Ok(Json(manager.hydrate().await.into()))
}

/// Add a product to the cart.
#[instrument(skip(state, session, request), fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    require_id(request.product_id.is_blank(), "productId")?;

    let product = request.options.into_iter().fold(
        CatalogReference::new(request.product_id),
        |reference, (name, value)| reference.with_option(name, value),
    );

    let manager = manager(&state, session).await?;
    let cart = manager.add_item(product, request.quantity).await?;
    Ok(Json(CartView::from_cart(cart)))
}

/// Set a line's quantity.
#[instrument(skip(state, session, request), fields(line_item_id = %request.line_item_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    require_id(request.line_item_id.is_blank(), "lineItemId")?;

    let manager = manager(&state, session).await?;
    let cart = manager
        .update_quantity(request.line_item_id, request.quantity)
        .await?;
    Ok(Json(CartView::from_cart(cart)))
}

/// Remove a line.
#[instrument(skip(state, session, request), fields(line_item_id = %request.line_item_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    require_id(request.line_item_id.is_blank(), "lineItemId")?;

    let manager = manager(&state, session).await?;
    let cart = manager.remove_item(request.line_item_id).await?;
    Ok(Json(CartView::from_cart(cart)))
}

/// Redirect to the hosted checkout for the current cart.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Response> {
    let callbacks = CheckoutCallbacks::success_page(state.config().public_base_url());
    let manager = manager(&state, session).await?;
    let url = manager.checkout(&callbacks).await?;
    Ok(Redirect::to(&url).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontieres_core::{CartId, LineItem, Price, Quantity};

    use super::*;

    fn cart_with_line(quantity: i64) -> Cart {
        Cart {
            id: CartId::new("cart-1"),
            line_items: vec![LineItem {
                id: LineItemId::new("line-1"),
                product: CatalogReference::new("prod-1"),
                quantity: Quantity::clamped(quantity),
                price: Price::parse("12.50", "EUR").unwrap(),
                formatted_price: None,
                name: "Mangue Kent".to_string(),
                image_url: None,
            }],
            currency: "EUR".to_string(),
            formatted_subtotal: None,
        }
    }

    #[test]
    fn test_cart_view_from_states() {
        let view = CartView::from(CartState::Empty);
        assert_eq!(view.item_count, 0);
        assert!(view.cart.is_none());

        let view = CartView::from(CartState::Hydrated(cart_with_line(3)));
        assert_eq!(view.item_count, 3);
        assert!(view.subtotal.is_some());
    }

    #[test]
    fn test_add_request_defaults() {
        let request: AddToCartRequest =
            serde_json::from_str(r#"{"productId": "prod-1"}"#).unwrap();
        assert_eq!(request.quantity, 1);
        assert!(request.options.is_empty());

        let request: AddToCartRequest = serde_json::from_str(
            r#"{"productId": "prod-1", "quantity": 2, "options": {"Taille": "M"}}"#,
        )
        .unwrap();
        assert_eq!(request.quantity, 2);
        assert_eq!(request.options["Taille"], "M");
    }

    #[tokio::test]
    async fn test_cart_key_is_stable_per_session() {
        let store = Arc::new(tower_sessions::MemoryStore::default());
        let session = Session::new(None, store, None);

        let first = cart_key(&session).await.unwrap();
        let second = cart_key(&session).await.unwrap();
        assert_eq!(first, second);
    }
}
