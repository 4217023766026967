//! Admin API handlers: site configuration, image uploads and environment
//! status.
//!
//! The configuration revision travels as a quoted `ETag`. A save carrying
//! `If-Match` is rejected with `409` when someone else saved in between.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use frontieres_core::SiteConfiguration;
use serde::Serialize;
use tracing::instrument;

use crate::config::EnvironmentStatus;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// Successful configuration save.
#[derive(Debug, Serialize)]
pub struct SaveConfigResponse {
    pub success: bool,
    pub config: SiteConfiguration,
}

/// Successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

fn etag(revision: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("\"{revision}\"")).ok()
}

fn with_etag(mut response: Response, revision: Option<u64>) -> Response {
    if let Some(value) = revision.and_then(etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

/// Parse `If-Match` into an expected revision.
///
/// Accepts `"7"`, `7` and `W/"7"`. A missing header or `*` means "no
/// expectation".
fn expected_revision(headers: &HeaderMap) -> Result<Option<u64>> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| AppError::BadRequest("Invalid If-Match header".to_string()))?
        .trim();
    if raw == "*" {
        return Ok(None);
    }

    raw.trim_start_matches("W/")
        .trim_matches('"')
        .parse::<u64>()
        .map(Some)
        .map_err(|_| AppError::BadRequest("Invalid If-Match header".to_string()))
}

/// Return the current site configuration.
#[instrument(skip(state))]
pub async fn get_config(State(state): State<AppState>) -> Result<Response> {
    let loaded = state.site_config().read().await?;
    tracing::debug!(source = ?loaded.source, revision = ?loaded.revision, "Configuration read");

    Ok(with_etag(Json(loaded.config).into_response(), loaded.revision))
}

/// Replace the site configuration.
///
/// The body is parsed here rather than through the `Json` extractor so that
/// every malformed document is a `400`.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn save_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let expected = expected_revision(&headers)?;
    let config: SiteConfiguration = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid configuration document: {e}")))?;

    let saved = state.site_config().write(config, expected).await?;
    tracing::info!(revision = ?saved.revision, "Site configuration saved");

    let response = Json(SaveConfigResponse {
        success: true,
        config: saved.config,
    })
    .into_response();
    Ok(with_etag(response, saved.revision))
}

/// Store an uploaded image and return its public URL.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;

        let asset = state
            .uploader()
            .store(bytes, &file_name, content_type.as_deref())
            .await?;
        tracing::info!(url = %asset.url, backend = ?asset.backend, "Upload stored");

        return Ok(Json(UploadResponse {
            success: true,
            url: asset.url,
        }));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

/// Which remote services are configured. Booleans only, never values.
#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Json<EnvironmentStatus> {
    Json(state.config().status())
}
