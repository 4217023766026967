//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server errors are captured to
//! Sentry before responding; clients get a JSON body `{"error": "..."}` that
//! never carries backend details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::cart::CartError;
use crate::commerce::CommerceError;
use crate::site_config::ConfigStoreError;
use crate::uploads::UploadError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Site configuration read or write failed.
    #[error("Configuration error: {0}")]
    ConfigStore(#[from] ConfigStoreError),

    /// Upload could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog query failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const fn commerce_status(err: &CommerceError) -> StatusCode {
    match err {
        CommerceError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        CommerceError::NotFound(_) => StatusCode::NOT_FOUND,
        CommerceError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        CommerceError::Http(_)
        | CommerceError::Status { .. }
        | CommerceError::Parse(_)
        | CommerceError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ConfigStore(ConfigStoreError::Invalid(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ConfigStore(ConfigStoreError::RevisionConflict { .. }) => StatusCode::CONFLICT,
            Self::ConfigStore(_) | Self::Upload(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Cart(err) => match err {
                CartError::Busy => StatusCode::CONFLICT,
                CartError::EmptyCart => StatusCode::BAD_REQUEST,
                CartError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                CartError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                CartError::Backend(inner) => commerce_status(inner),
            },
            Self::Commerce(err) => commerce_status(err),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message safe to show to clients.
    fn public_message(&self) -> String {
        match self {
            Self::ConfigStore(ConfigStoreError::Invalid(err)) => err.to_string(),
            Self::ConfigStore(ConfigStoreError::RevisionConflict { .. }) => {
                "Configuration was modified since it was loaded".to_string()
            }
            Self::ConfigStore(_) => "Configuration storage unavailable".to_string(),
            Self::Upload(_) => "Upload failed".to_string(),
            Self::Cart(CartError::Busy) => "Another cart update is in progress".to_string(),
            Self::Cart(CartError::EmptyCart) => "Cart is empty".to_string(),
            Self::Cart(CartError::Timeout(_)) => "Cart service timed out".to_string(),
            Self::Cart(CartError::NotConfigured) | Self::Commerce(CommerceError::NotConfigured) => {
                "Shop is not configured".to_string()
            }
            Self::Cart(CartError::Backend(CommerceError::RateLimited(_)))
            | Self::Commerce(CommerceError::RateLimited(_)) => {
                "Too many requests, please retry shortly".to_string()
            }
            Self::Commerce(CommerceError::NotFound(_)) => "Not found".to_string(),
            Self::Cart(CartError::Backend(_)) | Self::Commerce(_) => {
                "External service error".to_string()
            }
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
