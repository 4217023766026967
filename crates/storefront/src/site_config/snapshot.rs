//! Local configuration snapshot file.
//!
//! A pretty-printed copy of the document on disk. Used as the read fallback
//! when the remote store is unreachable, and as the only store in local
//! development.

use std::path::{Path, PathBuf};

use frontieres_core::SiteConfiguration;
use thiserror::Error;
use tokio::fs;
use tracing::instrument;

/// Snapshot file errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot file handle.
#[derive(Debug, Clone)]
pub struct LocalSnapshot {
    path: PathBuf,
}

impl LocalSnapshot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not a valid
    /// document.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn read(&self) -> Result<SiteConfiguration, SnapshotError> {
        let data = fs::read_to_string(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        serde_json::from_str(&data).map_err(|source| SnapshotError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the snapshot.
    ///
    /// Writes to a sibling temporary file first and renames it over the
    /// snapshot, so readers never observe a half-written document.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    #[instrument(skip(self, config), fields(path = %self.path.display()))]
    pub async fn write(&self, config: &SiteConfiguration) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let body = serde_json::to_string_pretty(config).map_err(|source| SnapshotError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .await
            .map_err(|source| self.io_error(source))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = LocalSnapshot::new(dir.path().join("data/siteConfig.json"));
        let config = SiteConfiguration::bundled_default();

        snapshot.write(&config).await.unwrap();
        assert_eq!(snapshot.read().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_written_file_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = LocalSnapshot::new(dir.path().join("siteConfig.json"));
        snapshot
            .write(&SiteConfiguration::empty_shell())
            .await
            .unwrap();

        let raw = std::fs::read_to_string(snapshot.path()).unwrap();
        assert!(raw.starts_with("{\n  \"topBanner\""));
        assert!(!dir.path().join("siteConfig.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = LocalSnapshot::new(dir.path().join("absent.json"));
        assert!(matches!(
            snapshot.read().await,
            Err(SnapshotError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("siteConfig.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            LocalSnapshot::new(path).read().await,
            Err(SnapshotError::Parse { .. })
        ));
    }
}
