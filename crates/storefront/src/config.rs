//! Storefront configuration loaded from environment variables.
//!
//! Every remote service is optional: a missing variable selects the
//! corresponding fallback path instead of failing startup.
//!
//! # Environment Variables
//!
//! ## Remote services (all optional)
//! - `KV_REST_API_URL` / `KV_REST_API_TOKEN` - Remote key-value store (site configuration)
//! - `UPSTASH_REDIS_REST_URL` / `UPSTASH_REDIS_REST_TOKEN` - Accepted aliases for the pair above
//! - `BLOB_READ_WRITE_TOKEN` - Remote object storage token (image uploads)
//! - `PUBLIC_BASE_URL` - Public URL of the storefront (checkout callbacks)
//! - `COMMERCE_CLIENT_ID` - Commerce backend OAuth client ID (catalog and cart)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SITE_CONFIG_SNAPSHOT` - Local configuration snapshot (default: data/siteConfig.json)
//! - `PUBLIC_DIR` - Publicly served directory for local uploads (default: public)
//! - `BLOB_API_URL` - Object storage API (default: <https://blob.vercel-storage.com>)
//! - `COMMERCE_API_URL` - Commerce backend API (default: <https://www.wixapis.com>)
//! - `COMMERCE_STORES_APP_ID` - Catalog application ID used in cart line references
//! - `CART_TIMEOUT_SECS` - Upper bound on one cart round-trip (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
const DEFAULT_COMMERCE_API_URL: &str = "https://www.wixapis.com";
const DEFAULT_STORES_APP_ID: &str = "215238eb-22a5-4c36-9e7b-e7c08025e04e";
const DEFAULT_CART_TIMEOUT_SECS: u64 = 15;

/// Values shipped in sample `.env` files that mean "not configured yet".
const PLACEHOLDER_VALUES: &[&str] = &["votre_client_id_ici"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, when explicitly configured
    pub base_url: Option<String>,
    /// Remote key-value store for the site configuration
    pub remote_store: Option<RemoteStoreConfig>,
    /// Remote object storage for uploads
    pub blob: Option<BlobConfig>,
    /// Commerce backend configuration
    pub commerce: CommerceConfig,
    /// Local configuration snapshot file
    pub snapshot_path: PathBuf,
    /// Publicly served directory (local uploads land in `uploads/` below it)
    pub public_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Remote key-value store (REST) configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct RemoteStoreConfig {
    /// REST endpoint
    pub url: String,
    /// Bearer token
    pub token: SecretString,
}

impl std::fmt::Debug for RemoteStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStoreConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Remote object storage configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct BlobConfig {
    /// Object storage API endpoint
    pub api_url: String,
    /// Read-write token
    pub token: SecretString,
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobConfig")
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Commerce backend configuration.
#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// REST API base URL
    pub api_url: String,
    /// OAuth client ID (public, visitor tokens)
    pub client_id: Option<String>,
    /// Catalog application ID sent in cart line references
    pub stores_app_id: String,
    /// Upper bound on a single cart round-trip
    pub cart_timeout: Duration,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_COMMERCE_API_URL.to_owned(),
            client_id: None,
            stores_app_id: DEFAULT_STORES_APP_ID.to_owned(),
            cart_timeout: Duration::from_secs(DEFAULT_CART_TIMEOUT_SECS),
        }
    }
}

/// Which environment switches are set. Served by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvironmentStatus {
    pub remote: RemoteStatus,
    pub commerce: CommerceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStatus {
    pub base_url: bool,
    pub kv: bool,
    pub blob: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceStatus {
    pub client_id: bool,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` only for variables that are present but
    /// unparseable. Missing remote credentials never fail.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        let cart_timeout_secs = get_env_or_default(
            "CART_TIMEOUT_SECS",
            &DEFAULT_CART_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("CART_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Self {
            host,
            port,
            base_url: get_configured_env("PUBLIC_BASE_URL")
                .map(|raw| parse_base_url(&raw))
                .transpose()?,
            remote_store: RemoteStoreConfig::from_env(),
            blob: BlobConfig::from_env(),
            commerce: CommerceConfig {
                api_url: get_env_or_default("COMMERCE_API_URL", DEFAULT_COMMERCE_API_URL),
                client_id: get_configured_env("COMMERCE_CLIENT_ID"),
                stores_app_id: get_env_or_default("COMMERCE_STORES_APP_ID", DEFAULT_STORES_APP_ID),
                cart_timeout: Duration::from_secs(cart_timeout_secs),
            },
            snapshot_path: PathBuf::from(get_env_or_default(
                "SITE_CONFIG_SNAPSHOT",
                "data/siteConfig.json",
            )),
            public_dir: PathBuf::from(get_env_or_default("PUBLIC_DIR", "public")),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration with every remote service absent. Local-only development.
    #[must_use]
    pub fn local(snapshot_path: PathBuf, public_dir: PathBuf) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: None,
            remote_store: None,
            blob: None,
            commerce: CommerceConfig::default(),
            snapshot_path,
            public_dir,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Public base URL, defaulting to the local development address.
    #[must_use]
    pub fn public_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map_or(DEFAULT_BASE_URL, |url| url.trim_end_matches('/'))
    }

    /// Directory local uploads are written to.
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join("uploads")
    }

    /// Which remote services are configured.
    #[must_use]
    pub const fn status(&self) -> EnvironmentStatus {
        EnvironmentStatus {
            remote: RemoteStatus {
                base_url: self.base_url.is_some(),
                kv: self.remote_store.is_some(),
                blob: self.blob.is_some(),
            },
            commerce: CommerceStatus {
                client_id: self.commerce.client_id.is_some(),
            },
        }
    }
}

impl RemoteStoreConfig {
    fn from_env() -> Option<Self> {
        let pair = |url_key: &str, token_key: &str| {
            Some(Self {
                url: get_configured_env(url_key)?,
                token: SecretString::from(get_configured_env(token_key)?),
            })
        };

        pair("KV_REST_API_URL", "KV_REST_API_TOKEN")
            .or_else(|| pair("UPSTASH_REDIS_REST_URL", "UPSTASH_REDIS_REST_TOKEN"))
    }
}

impl BlobConfig {
    fn from_env() -> Option<Self> {
        Some(Self {
            api_url: get_env_or_default("BLOB_API_URL", DEFAULT_BLOB_API_URL),
            token: SecretString::from(get_configured_env("BLOB_READ_WRITE_TOKEN")?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse `PUBLIC_BASE_URL`: absolute http(s), no trailing slash.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid =
        |reason: String| ConfigError::InvalidEnvVar("PUBLIC_BASE_URL".to_string(), reason);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }

    Ok(url.as_str().trim_end_matches('/').to_owned())
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable that counts as set only when it holds a real value.
fn get_configured_env(key: &str) -> Option<String> {
    get_optional_env(key).filter(|value| !is_placeholder(value))
}

/// Whether a value is empty or exactly a known placeholder.
fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || PLACEHOLDER_VALUES.contains(&trimmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("   "));
        assert!(is_placeholder("votre_client_id_ici"));
        assert!(!is_placeholder("3f1c9a2e-77aa-4d2b-9d5e-0c1f2e3d4b5a"));
    }

    #[test]
    fn test_real_values_are_not_placeholders() {
        assert!(!is_placeholder("https://todo-app-12345.upstash.io"));
        assert!(!is_placeholder("https://your-shop.upstash.io"));
        assert!(!is_placeholder("AXxxxYZabc123token"));
        assert!(!is_placeholder("vercel_blob_rw_placeholderish_42"));
        assert!(!is_placeholder("VOTRE_CLIENT_ID_ICI_v2"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig::local("snap.json".into(), "public".into());

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_public_base_url_default_and_trim() {
        let mut config = StorefrontConfig::local("snap.json".into(), "public".into());
        assert_eq!(config.public_base_url(), "http://localhost:3000");

        config.base_url = Some("https://shop.example.fr/".to_owned());
        assert_eq!(config.public_base_url(), "https://shop.example.fr");
    }

    #[test]
    fn test_status_reflects_configured_services() {
        let mut config = StorefrontConfig::local("snap.json".into(), "public".into());
        assert_eq!(
            config.status(),
            EnvironmentStatus {
                remote: RemoteStatus {
                    base_url: false,
                    kv: false,
                    blob: false,
                },
                commerce: CommerceStatus { client_id: false },
            }
        );

        config.blob = Some(BlobConfig {
            api_url: DEFAULT_BLOB_API_URL.to_owned(),
            token: SecretString::from("blob-token".to_owned()),
        });
        config.commerce.client_id = Some("client".to_owned());

        let status = config.status();
        assert!(status.remote.blob);
        assert!(status.commerce.client_id);
        assert!(!status.remote.kv);
    }

    #[test]
    fn test_status_serialization() {
        let config = StorefrontConfig::local("snap.json".into(), "public".into());
        let json = serde_json::to_value(config.status()).unwrap();
        assert_eq!(json["remote"]["baseUrl"], false);
        assert_eq!(json["commerce"]["clientId"], false);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let remote = RemoteStoreConfig {
            url: "https://kv.example.com".to_owned(),
            token: SecretString::from("super_secret_kv_token".to_owned()),
        };
        let blob = BlobConfig {
            api_url: DEFAULT_BLOB_API_URL.to_owned(),
            token: SecretString::from("super_secret_blob_token".to_owned()),
        };

        let debug_output = format!("{remote:?} {blob:?}");

        assert!(debug_output.contains("https://kv.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_kv_token"));
        assert!(!debug_output.contains("super_secret_blob_token"));
    }

    #[test]
    fn test_parse_base_url() {
        assert_eq!(
            parse_base_url("https://shop.example.fr/").unwrap(),
            "https://shop.example.fr"
        );
        assert_eq!(
            parse_base_url(" http://localhost:3000 ").unwrap(),
            "http://localhost:3000"
        );
        assert!(parse_base_url("shop.example.fr").is_err());
        assert!(parse_base_url("ftp://shop.example.fr").is_err());
    }

    #[test]
    fn test_uploads_dir() {
        let config = StorefrontConfig::local("snap.json".into(), "/srv/public".into());
        assert_eq!(config.uploads_dir(), PathBuf::from("/srv/public/uploads"));
    }
}
