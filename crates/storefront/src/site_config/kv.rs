//! Remote key-value store client (REST).
//!
//! Speaks the Upstash-style REST protocol used by managed Redis offerings:
//!
//! ```text
//! GET  {url}/get/{key}          -> {"result": "<value>" | null}
//! POST {url}/set/{key}  <body>  -> {"result": "OK"}
//! ```
//!
//! Both calls authenticate with `Authorization: Bearer <token>`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::RemoteStoreConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors talking to the remote key-value store.
#[derive(Debug, Error)]
pub enum KvError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The store's response body was not understood.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// String-valued key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value. `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Replace a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
}

#[derive(Debug, Deserialize)]
struct KvResponse {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// REST client for the remote key-value store.
#[derive(Clone)]
pub struct RestKvClient {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl RestKvClient {
    #[must_use]
    pub fn new(config: &RemoteStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<KvResponse, KvError> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<KvResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(KvError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: KvResponse = serde_json::from_str(&body)?;
        if let Some(message) = parsed.error {
            return Err(KvError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(parsed)
    }
}

#[async_trait]
impl KeyValueStore for RestKvClient {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let url = format!("{}/get/{key}", self.base_url);
        let response = self.send(self.client.get(url)).await?;

        Ok(match response.result {
            serde_json::Value::Null => None,
            serde_json::Value::String(value) => Some(value),
            // Some clients store JSON documents natively
            other => Some(other.to_string()),
        })
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let url = format!("{}/set/{key}", self.base_url);
        self.send(self.client.post(url).body(value.to_owned()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> RestKvClient {
        RestKvClient::new(&RemoteStoreConfig {
            url: format!("{}/", server.uri()),
            token: SecretString::from("kv-token".to_owned()),
        })
    }

    #[tokio::test]
    async fn test_get_present_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get/site-config"))
            .and(header("authorization", "Bearer kv-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"result": "{\"a\":1}"})),
            )
            .mount(&server)
            .await;

        let value = client(&server).get("site-config").await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_get_absent_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get/site-config"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": null})),
            )
            .mount(&server)
            .await;

        assert!(client(&server).get("site-config").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_native_json_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": {"a": 1}})),
            )
            .mount(&server)
            .await;

        let value = client(&server).get("site-config").await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_set_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/set/site-config"))
            .and(body_string("payload"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": "OK"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client(&server).set("site-config", "payload").await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": "Unauthorized"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).get("site-config").await.unwrap_err();
        assert!(matches!(
            err,
            KvError::Status { status: 401, ref message } if message == "Unauthorized"
        ));
    }
}
