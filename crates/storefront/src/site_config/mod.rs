//! Site configuration persistence.
//!
//! The remote key-value store is authoritative. The local snapshot file is
//! a read fallback and the write target in local development, when no remote
//! store is configured.
//!
//! Remotely the document lives inside a revision envelope:
//!
//! ```json
//! { "revision": 7, "updatedAt": "2025-06-01T10:00:00Z", "config": { ... } }
//! ```
//!
//! A bare document (written before envelopes existed) reads as revision 0.

pub mod kv;
pub mod snapshot;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use frontieres_core::{SiteConfigError, SiteConfiguration};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::config::StorefrontConfig;
use crate::fallback::{Exhausted, FallbackChain};

pub use kv::{KeyValueStore, KvError, RestKvClient};
pub use snapshot::{LocalSnapshot, SnapshotError};

/// Key of the configuration document in the remote store.
pub const SITE_CONFIG_KEY: &str = "site-config";

/// Errors from reading or writing the site configuration.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("remote store is not configured")]
    RemoteNotConfigured,

    #[error("remote store error: {0}")]
    Remote(#[from] KvError),

    #[error("local snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("stored configuration is unreadable: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] SiteConfigError),

    #[error("revision conflict: expected {expected}, stored {current}")]
    RevisionConflict { expected: u64, current: u64 },

    #[error(transparent)]
    Exhausted(#[from] Exhausted<ConfigStoreError>),
}

/// Where a configuration read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Remote,
    /// Remote was empty and has been seeded with the bundled default.
    Seeded,
    Snapshot,
}

/// A configuration read.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SiteConfiguration,
    /// Remote revision. `None` when read from the snapshot.
    pub revision: Option<u64>,
    pub source: ConfigSource,
}

/// A successful configuration write.
#[derive(Debug, Clone)]
pub struct SavedConfig {
    /// The document as stored, ids normalized.
    pub config: SiteConfiguration,
    /// New remote revision. `None` when only the snapshot was written.
    pub revision: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    revision: u64,
    updated_at: DateTime<Utc>,
    config: SiteConfiguration,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Envelope(Envelope),
    Bare(SiteConfiguration),
}

#[derive(Debug, Deserialize)]
struct RevisionOnly {
    #[serde(default)]
    revision: u64,
}

fn decode(raw: &str) -> Result<(u64, SiteConfiguration), serde_json::Error> {
    Ok(match serde_json::from_str(raw)? {
        StoredValue::Envelope(envelope) => (envelope.revision, envelope.config),
        StoredValue::Bare(config) => (0, config),
    })
}

/// Revision of a stored value. Unreadable values count as revision 0 so an
/// admin save can always replace them.
fn stored_revision(raw: &str) -> u64 {
    match serde_json::from_str::<RevisionOnly>(raw) {
        Ok(stored) => stored.revision,
        Err(e) => {
            tracing::warn!(error = %e, "Stored configuration unreadable, treating as revision 0");
            0
        }
    }
}

/// Site configuration store.
#[derive(Clone)]
pub struct SiteConfigStore {
    inner: Arc<Inner>,
}

struct Inner {
    remote: Option<Arc<dyn KeyValueStore>>,
    snapshot: LocalSnapshot,
    /// Held across the revision read and the envelope write.
    write_lock: Mutex<()>,
}

impl SiteConfigStore {
    #[must_use]
    pub fn new(remote: Option<Arc<dyn KeyValueStore>>, snapshot: LocalSnapshot) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                snapshot,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Build the store from environment configuration.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        let remote = config
            .remote_store
            .as_ref()
            .map(|remote| Arc::new(RestKvClient::new(remote)) as Arc<dyn KeyValueStore>);
        Self::new(remote, LocalSnapshot::new(config.snapshot_path.clone()))
    }

    #[must_use]
    pub fn remote_configured(&self) -> bool {
        self.inner.remote.is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> &LocalSnapshot {
        &self.inner.snapshot
    }

    /// Read the configuration: remote first, then the local snapshot.
    ///
    /// An absent remote document is seeded with the bundled default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Exhausted`] when neither source yields a
    /// document.
    #[instrument(skip(self))]
    pub async fn read(&self) -> Result<LoadedConfig, ConfigStoreError> {
        let resolved = FallbackChain::new("site_config.read")
            .attempt_if(self.remote_configured(), "remote", self.read_remote())
            .attempt("snapshot", self.read_snapshot())
            .run()
            .await?;

        tracing::debug!(backend = resolved.backend, "Site configuration resolved");
        Ok(resolved.value)
    }

    /// Whether some source can serve the configuration, without seeding.
    ///
    /// An empty remote store counts as readable: a read would seed it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Exhausted`] when neither source is usable.
    #[instrument(skip(self))]
    pub async fn check(&self) -> Result<ConfigSource, ConfigStoreError> {
        let resolved = FallbackChain::new("site_config.check")
            .attempt_if(self.remote_configured(), "remote", self.peek_remote())
            .attempt("snapshot", async {
                self.read_snapshot().await.map(|loaded| loaded.source)
            })
            .run()
            .await?;
        Ok(resolved.value)
    }

    /// Read the configuration, degrading to the empty shell when every
    /// source fails.
    #[instrument(skip(self))]
    pub async fn read_or_default(&self) -> SiteConfiguration {
        match self.read().await {
            Ok(loaded) => loaded.config,
            Err(e) => {
                tracing::error!(error = %e, "Site configuration unavailable, serving empty shell");
                SiteConfiguration::empty_shell()
            }
        }
    }

    /// Replace the configuration.
    ///
    /// Blank list item ids are filled and the document is validated before
    /// anything is written. With a remote store, the remote write decides
    /// the outcome and the snapshot is refreshed best-effort. Without one,
    /// the snapshot is the store.
    ///
    /// `expected_revision` enables optimistic concurrency against the remote
    /// revision. It is ignored in snapshot-only mode, which has no revisions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Invalid`] for a rejected document,
    /// [`ConfigStoreError::RevisionConflict`] when `expected_revision` is
    /// stale, and a storage error when the authoritative write fails.
    #[instrument(skip(self, config))]
    pub async fn write(
        &self,
        mut config: SiteConfiguration,
        expected_revision: Option<u64>,
    ) -> Result<SavedConfig, ConfigStoreError> {
        config.prepare_for_write()?;

        let Some(remote) = self.inner.remote.as_deref() else {
            self.inner.snapshot.write(&config).await?;
            tracing::info!("Site configuration saved to local snapshot");
            return Ok(SavedConfig {
                config,
                revision: None,
            });
        };

        let _guard = self.inner.write_lock.lock().await;
        let current = remote
            .get(SITE_CONFIG_KEY)
            .await?
            .map_or(0, |raw| stored_revision(&raw));

        if let Some(expected) = expected_revision
            && expected != current
        {
            return Err(ConfigStoreError::RevisionConflict { expected, current });
        }

        let revision = current + 1;
        put_envelope(remote, revision, &config).await?;
        tracing::info!(revision, "Site configuration saved");

        if let Err(e) = self.inner.snapshot.write(&config).await {
            tracing::warn!(error = %e, "Local snapshot refresh failed");
        }

        Ok(SavedConfig {
            config,
            revision: Some(revision),
        })
    }

    async fn read_remote(&self) -> Result<LoadedConfig, ConfigStoreError> {
        let Some(remote) = self.inner.remote.as_deref() else {
            return Err(ConfigStoreError::RemoteNotConfigured);
        };

        if let Some(raw) = remote.get(SITE_CONFIG_KEY).await? {
            let (revision, config) = decode(&raw)?;
            return Ok(LoadedConfig {
                config,
                revision: Some(revision),
                source: ConfigSource::Remote,
            });
        }

        let _guard = self.inner.write_lock.lock().await;
        if let Some(raw) = remote.get(SITE_CONFIG_KEY).await? {
            let (revision, config) = decode(&raw)?;
            return Ok(LoadedConfig {
                config,
                revision: Some(revision),
                source: ConfigSource::Remote,
            });
        }

        let config = SiteConfiguration::bundled_default();
        let revision = match put_envelope(remote, 1, &config).await {
            Ok(()) => {
                tracing::info!("Remote store empty, seeded bundled default");
                Some(1)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Seeding remote store failed, serving bundled default");
                None
            }
        };

        Ok(LoadedConfig {
            config,
            revision,
            source: ConfigSource::Seeded,
        })
    }

    async fn peek_remote(&self) -> Result<ConfigSource, ConfigStoreError> {
        let Some(remote) = self.inner.remote.as_deref() else {
            return Err(ConfigStoreError::RemoteNotConfigured);
        };

        match remote.get(SITE_CONFIG_KEY).await? {
            Some(raw) => {
                decode(&raw)?;
                Ok(ConfigSource::Remote)
            }
            None => Ok(ConfigSource::Seeded),
        }
    }

    async fn read_snapshot(&self) -> Result<LoadedConfig, ConfigStoreError> {
        let config = self.inner.snapshot.read().await?;
        Ok(LoadedConfig {
            config,
            revision: None,
            source: ConfigSource::Snapshot,
        })
    }
}

async fn put_envelope(
    remote: &dyn KeyValueStore,
    revision: u64,
    config: &SiteConfiguration,
) -> Result<(), ConfigStoreError> {
    let envelope = Envelope {
        revision,
        updated_at: Utc::now(),
        config: config.clone(),
    };
    let body = serde_json::to_string(&envelope)?;
    remote.set(SITE_CONFIG_KEY, &body).await?;
    Ok(())
}
