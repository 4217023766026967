//! Local filesystem upload storage, served under `/uploads`.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::instrument;

use super::UploadError;

/// Public URL prefix of locally stored uploads.
pub const LOCAL_URL_PREFIX: &str = "/uploads";

/// Upload directory inside the public directory.
#[derive(Debug, Clone)]
pub struct LocalUploads {
    dir: PathBuf,
}

impl LocalUploads {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` as `filename` and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Io`] if the directory or file cannot be written.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn write(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let path = self.dir.join(filename);
        let io_error = |source| UploadError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).await.map_err(io_error)?;
        fs::write(&path, bytes).await.map_err(io_error)?;

        Ok(format!("{LOCAL_URL_PREFIX}/{filename}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = LocalUploads::new(dir.path().join("public/uploads"));

        let url = uploads.write("1-logo.png", b"png").await.unwrap();
        assert_eq!(url, "/uploads/1-logo.png");
        assert_eq!(
            std::fs::read(dir.path().join("public/uploads/1-logo.png")).unwrap(),
            b"png"
        );
    }
}
