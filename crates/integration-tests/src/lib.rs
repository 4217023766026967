//! Integration test harness for Frontières.
//!
//! Tests drive the full router (middleware included) in-process with
//! `tower::ServiceExt::oneshot`. Remote services are `wiremock` servers and
//! the snapshot and public directories live in a temporary directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p frontieres-integration-tests
//! ```

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use frontieres_storefront::config::{BlobConfig, RemoteStoreConfig, StorefrontConfig};
use frontieres_storefront::routes;
use frontieres_storefront::state::AppState;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "frontieres-test-boundary";

/// A storefront configured against a temporary directory.
pub struct TestContext {
    pub dir: TempDir,
    pub config: StorefrontConfig,
}

impl TestContext {
    /// Local-only configuration: no remote store, no object storage, no
    /// commerce backend.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig::local(
            dir.path().join("data").join("siteConfig.json"),
            dir.path().join("public"),
        );
        Self { dir, config }
    }

    #[must_use]
    pub fn with_remote_store(mut self, url: &str) -> Self {
        self.config.remote_store = Some(RemoteStoreConfig {
            url: url.to_owned(),
            token: "kv-token".to_owned().into(),
        });
        self
    }

    #[must_use]
    pub fn with_blob(mut self, url: &str) -> Self {
        self.config.blob = Some(BlobConfig {
            api_url: url.to_owned(),
            token: "blob-token".to_owned().into(),
        });
        self
    }

    #[must_use]
    pub fn with_commerce(mut self, url: &str) -> Self {
        self.config.commerce.api_url = url.to_owned();
        self.config.commerce.client_id = Some("test-client".to_owned());
        self.config.commerce.cart_timeout = Duration::from_secs(5);
        self
    }

    /// The full application router.
    #[must_use]
    pub fn app(&self) -> Router {
        routes::app(AppState::new(self.config.clone()))
    }

    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.config.snapshot_path.clone()
    }

    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.config.uploads_dir()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Send one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// `GET` with an optional session cookie.
#[must_use]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `POST` a JSON body with an optional session cookie.
#[must_use]
pub fn post_json(uri: &str, body: &serde_json::Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Read a response body as JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as raw bytes.
pub async fn raw_body(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// The `name=value` pair of the session cookie set by a response.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("frontieres_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_owned)
}

/// A multipart body with one part.
#[must_use]
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A multipart body with one text field and no file.
#[must_use]
pub fn multipart_text(field: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n--{BOUNDARY}--\r\n"
    )
    .into_bytes()
}

/// `POST /api/admin/upload` with a prepared multipart body.
#[must_use]
pub fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/admin/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Contents of the in-memory remote key-value store.
#[derive(Clone, Default)]
pub struct KvEntries(Arc<Mutex<HashMap<String, String>>>);

impl KvEntries {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.0.lock().unwrap().insert(key.to_owned(), value.to_owned());
    }
}

/// Answers the key-value REST protocol from [`KvEntries`].
struct KvResponder(KvEntries);

impl Respond for KvResponder {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        let path = request.url.path();
        if let Some(key) = path.strip_prefix("/get/") {
            return ResponseTemplate::new(200).set_body_json(json!({ "result": self.0.get(key) }));
        }
        if let Some(key) = path.strip_prefix("/set/") {
            self.0.insert(key, &String::from_utf8_lossy(&request.body));
            return ResponseTemplate::new(200).set_body_json(json!({ "result": "OK" }));
        }
        ResponseTemplate::new(404).set_body_json(json!({ "error": "unknown command" }))
    }
}

/// Start a remote key-value store backed by memory.
pub async fn start_kv() -> (MockServer, KvEntries) {
    let server = MockServer::start().await;
    let entries = KvEntries::default();
    Mock::given(any())
        .respond_with(KvResponder(entries.clone()))
        .mount(&server)
        .await;
    (server, entries)
}
