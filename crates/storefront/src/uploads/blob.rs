//! Remote object storage client.
//!
//! `PUT {api}/{pathname}` with the file as the body and a bearer token.
//! The store answers with the public URL of the stored object.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::BlobConfig;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from the remote object store.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Public object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under `pathname` and return its public URL.
    async fn put(
        &self,
        pathname: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, BlobError>;
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
}

/// REST client for the remote object store.
#[derive(Clone)]
pub struct BlobClient {
    client: reqwest::Client,
    api_url: String,
    token: SecretString,
}

impl BlobClient {
    #[must_use]
    pub fn new(config: &BlobConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for BlobClient {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn put(
        &self,
        pathname: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, BlobError> {
        let mut request = self
            .client
            .put(format!("{}/{pathname}", self.api_url))
            .bearer_auth(self.token.expose_secret())
            .header("x-add-random-suffix", "0")
            .timeout(UPLOAD_TIMEOUT)
            .body(bytes);

        if let Some(content_type) = content_type {
            request = request.header("x-content-type", content_type);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlobError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let stored: PutResponse = response.json().await?;
        Ok(stored.url)
    }
}
