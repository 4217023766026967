//! Site configuration for public renderers.

use axum::{Json, extract::State};
use frontieres_core::SiteConfiguration;
use tracing::instrument;

use crate::state::AppState;

/// Serve the site configuration.
///
/// Always succeeds: when no store is readable the empty shell is returned
/// and pages render their empty states.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<SiteConfiguration> {
    Json(state.site_config().read_or_default().await)
}
