//! Image uploads from the admin editor.
//!
//! Files go to remote object storage when a token is configured. Otherwise,
//! or when the remote store fails, they are written below the public
//! directory and served by the storefront itself. Uploaded files are never
//! deleted.

pub mod blob;
pub mod local;

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::StorefrontConfig;
use crate::fallback::{Exhausted, FallbackChain};

pub use blob::{BlobClient, BlobError, ObjectStore};
pub use local::{LOCAL_URL_PREFIX, LocalUploads};

/// Upload storage errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("remote storage is not configured")]
    RemoteNotConfigured,

    #[error("remote storage error: {0}")]
    Remote(#[from] BlobError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Exhausted(#[from] Exhausted<UploadError>),
}

/// Where an upload ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetBackend {
    Remote,
    Local,
}

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedAsset {
    /// Public URL: absolute for remote storage, `/uploads/...` for local.
    pub url: String,
    pub backend: AssetBackend,
}

/// Make a client-supplied file name safe for paths and URLs.
///
/// Characters outside `[A-Za-z0-9._-]` become `-`, runs of `-` collapse,
/// and leading dots are dropped.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if c == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(c);
    }

    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "file".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Upload storage with remote-then-local fallback.
#[derive(Clone)]
pub struct Uploader {
    remote: Option<Arc<dyn ObjectStore>>,
    local: LocalUploads,
}

impl Uploader {
    #[must_use]
    pub fn new(remote: Option<Arc<dyn ObjectStore>>, local: LocalUploads) -> Self {
        Self { remote, local }
    }

    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        let remote = config
            .blob
            .as_ref()
            .map(|blob| Arc::new(BlobClient::new(blob)) as Arc<dyn ObjectStore>);
        Self::new(remote, LocalUploads::new(config.uploads_dir()))
    }

    #[must_use]
    pub fn local(&self) -> &LocalUploads {
        &self.local
    }

    /// Store a file under a timestamped, sanitized name.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Exhausted`] when neither backend stores the file.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn store(
        &self,
        bytes: Bytes,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<UploadedAsset, UploadError> {
        let filename = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(file_name)
        );

        let resolved = FallbackChain::new("upload.store")
            .attempt_if(
                self.remote.is_some(),
                "remote",
                self.store_remote(&filename, bytes.clone(), content_type),
            )
            .attempt("local", self.store_local(&filename, &bytes))
            .run()
            .await?;

        tracing::info!(url = %resolved.value.url, backend = resolved.backend, "Upload stored");
        Ok(resolved.value)
    }

    async fn store_remote(
        &self,
        filename: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<UploadedAsset, UploadError> {
        let Some(remote) = self.remote.as_deref() else {
            return Err(UploadError::RemoteNotConfigured);
        };

        let pathname = format!("uploads/{filename}");
        let url = remote.put(&pathname, bytes, content_type).await?;
        Ok(UploadedAsset {
            url,
            backend: AssetBackend::Remote,
        })
    }

    async fn store_local(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadedAsset, UploadError> {
        let url = self.local.write(filename, bytes).await?;
        Ok(UploadedAsset {
            url,
            backend: AssetBackend::Local,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RecordingStore {
        fail: bool,
        puts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put(
            &self,
            pathname: &str,
            _bytes: Bytes,
            _content_type: Option<&str>,
        ) -> Result<String, BlobError> {
            self.puts.lock().unwrap().push(pathname.to_owned());
            if self.fail {
                return Err(BlobError::Status {
                    status: 500,
                    body: "down".to_owned(),
                });
            }
            Ok(format!("https://cdn.example.com/{pathname}"))
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("photo été 2024.jpg"), "photo-t-2024.jpg");
        assert_eq!(sanitize_file_name("a   b.png"), "a-b.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "-..-etc-passwd");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name("logo_v2-final.PNG"), "logo_v2-final.PNG");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("..."), "file");
        assert_eq!(sanitize_file_name("???"), "file");
    }

    #[tokio::test]
    async fn test_remote_configured_and_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(RecordingStore::default());
        let uploader = Uploader::new(
            Some(Arc::clone(&remote) as Arc<dyn ObjectStore>),
            LocalUploads::new(dir.path()),
        );

        let asset = uploader
            .store(Bytes::from_static(b"img"), "hero.jpg", Some("image/jpeg"))
            .await
            .unwrap();

        assert_eq!(asset.backend, AssetBackend::Remote);
        assert!(asset.url.starts_with("https://cdn.example.com/uploads/"));
        assert!(asset.url.ends_with("-hero.jpg"));
        assert_eq!(remote.puts.lock().unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        let uploader = Uploader::new(
            Some(remote as Arc<dyn ObjectStore>),
            LocalUploads::new(dir.path().join("uploads")),
        );

        let asset = uploader
            .store(Bytes::from_static(b"img"), "bannière.png", None)
            .await
            .unwrap();

        assert_eq!(asset.backend, AssetBackend::Local);
        let filename = asset.url.strip_prefix("/uploads/").unwrap();
        assert!(filename.ends_with("-banni-re.png"));
        assert_eq!(
            std::fs::read(dir.path().join("uploads").join(filename)).unwrap(),
            b"img"
        );
    }

    #[tokio::test]
    async fn test_without_remote_writes_locally() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = Uploader::new(None, LocalUploads::new(dir.path()));

        let asset = uploader
            .store(Bytes::from_static(b"img"), "logo.png", None)
            .await
            .unwrap();
        assert_eq!(asset.backend, AssetBackend::Local);
    }

    #[tokio::test]
    async fn test_every_backend_failing() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the upload directory should be
        let blocked = dir.path().join("uploads");
        std::fs::write(&blocked, "").unwrap();
        let uploader = Uploader::new(None, LocalUploads::new(blocked));

        let err = uploader
            .store(Bytes::from_static(b"img"), "logo.png", None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Exhausted(_)));
    }
}
