//! Catalog pass-through handlers.
//!
//! Listings degrade to an empty array when the commerce backend is
//! unavailable so pages can still render. A single product surfaces the
//! error, `404` included.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use frontieres_core::CollectionId;
use serde::Deserialize;
use tracing::instrument;

use crate::commerce::{Collection, Product, ProductQuery};
use crate::error::Result;
use crate::state::AppState;

/// Query parameters for product listings.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsParams {
    pub collection: Option<String>,
    pub limit: Option<u32>,
}

/// Latest products, optionally restricted to one collection.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(params): Query<ProductsParams>,
) -> Json<Vec<Product>> {
    let query = ProductQuery::new(params.collection.map(CollectionId::new), params.limit);

    match state.catalog().products(&query).await {
        Ok(products) => Json(products),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch products");
            Json(Vec::new())
        }
    }
}

/// One product by slug.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    let product = state.catalog().product_by_slug(&slug).await?;
    Ok(Json(product))
}

/// Every collection.
#[instrument(skip(state))]
pub async fn collections(State(state): State<AppState>) -> Json<Vec<Collection>> {
    match state.catalog().collections().await {
        Ok(collections) => Json(collections),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch collections");
            Json(Vec::new())
        }
    }
}
