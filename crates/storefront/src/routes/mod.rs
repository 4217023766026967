//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (site configuration readable)
//! GET  /uploads/*              - Locally stored uploads
//!
//! # Admin
//! GET  /api/admin/config       - Site configuration (ETag: revision)
//! POST /api/admin/config       - Replace site configuration (If-Match: revision)
//! POST /api/admin/upload       - Store an image (multipart, field `file`)
//! GET  /api/admin/status       - Which remote services are configured
//!
//! # Site
//! GET  /api/site               - Site configuration for renderers (never fails)
//!
//! # Catalog
//! GET  /api/products           - Latest products (?collection=&limit=)
//! GET  /api/products/{slug}    - Product detail
//! GET  /api/collections        - Collection listing
//!
//! # Cart
//! GET  /api/cart               - Current cart
//! POST /api/cart/add           - Add a product
//! POST /api/cart/update        - Set a line's quantity
//! POST /api/cart/remove        - Remove a line
//!
//! # Checkout
//! GET  /checkout               - Redirect to hosted checkout
//! ```

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod site;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;
use crate::uploads::LOCAL_URL_PREFIX;

/// Largest accepted upload request body.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the admin API router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(admin::get_config).post(admin::save_config))
        .route(
            "/upload",
            post(admin::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/status", get(admin::status))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/products/{slug}", get(catalog::product))
        .route("/collections", get(catalog::collections))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/site", get(site::show))
        .nest("/api/admin", admin_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api", catalog_routes())
        .route("/checkout", get(cart::checkout))
}

/// Build the complete application: routes, static uploads and the
/// middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    let uploads = ServeDir::new(state.config().uploads_dir());

    Router::new()
        .merge(routes())
        .nest_service(LOCAL_URL_PREFIX, uploads)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
