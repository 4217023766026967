//! Site configuration commands.
//!
//! # Usage
//!
//! ```bash
//! frontieres-cli config show
//! frontieres-cli config seed [--force]
//! frontieres-cli config validate <file>
//! ```
//!
//! # Environment Variables
//!
//! Same as the storefront: `KV_REST_API_URL` / `KV_REST_API_TOKEN` select
//! the remote store, `SITE_CONFIG_SNAPSHOT` the local snapshot.

use std::io::Write;
use std::path::{Path, PathBuf};

use frontieres_core::{SiteConfigError, SiteConfiguration};
use frontieres_storefront::config::{ConfigError, StorefrontConfig};
use frontieres_storefront::site_config::{ConfigSource, ConfigStoreError, SiteConfigStore};
use thiserror::Error;
use tracing::info;

/// Errors that can occur during configuration commands.
#[derive(Debug, Error)]
pub enum ConfigCommandError {
    /// Environment could not be loaded.
    #[error("Environment error: {0}")]
    Environment(#[from] ConfigError),

    /// Store read or write failed.
    #[error("Store error: {0}")]
    Store(#[from] ConfigStoreError),

    /// A configuration is already stored and `--force` was not given.
    #[error("A site configuration is already stored ({0}); pass --force to overwrite")]
    AlreadySeeded(&'static str),

    /// File could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a configuration document.
    #[error("Not a configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document breaks a configuration rule.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] SiteConfigError),
}

fn store() -> Result<SiteConfigStore, ConfigCommandError> {
    let config = StorefrontConfig::from_env()?;
    Ok(SiteConfigStore::from_config(&config))
}

fn print_json(config: &SiteConfiguration) -> Result<(), ConfigCommandError> {
    let json = serde_json::to_string_pretty(config)?;
    // A closed stdout (e.g. piped into `head`) is not a failure.
    let _ = writeln!(std::io::stdout().lock(), "{json}");
    Ok(())
}

/// Print the current configuration.
///
/// # Errors
///
/// Returns an error if neither the remote store nor the snapshot is readable.
pub async fn show() -> Result<(), ConfigCommandError> {
    let loaded = store()?.read().await?;
    info!(source = ?loaded.source, revision = ?loaded.revision, "Configuration loaded");
    print_json(&loaded.config)
}

/// Store the bundled default configuration.
///
/// Without `force`, refuses when a configuration is already readable. A
/// read that finds the remote store empty seeds it as a side effect.
///
/// # Errors
///
/// Returns [`ConfigCommandError::AlreadySeeded`] or a store error.
pub async fn seed(force: bool) -> Result<(), ConfigCommandError> {
    let store = store()?;

    if !force {
        match store.read().await {
            Ok(loaded) => match loaded.source {
                ConfigSource::Seeded => {
                    info!(revision = ?loaded.revision, "Remote store was empty, seeded");
                    return Ok(());
                }
                ConfigSource::Remote => return Err(ConfigCommandError::AlreadySeeded("remote")),
                ConfigSource::Snapshot => {
                    return Err(ConfigCommandError::AlreadySeeded("snapshot"));
                }
            },
            Err(e) => info!(error = %e, "No readable configuration, seeding"),
        }
    }

    let saved = store
        .write(SiteConfiguration::bundled_default(), None)
        .await?;
    info!(revision = ?saved.revision, "Bundled default configuration stored");
    Ok(())
}

/// Parse and validate a configuration file.
async fn check_file(path: &Path) -> Result<SiteConfiguration, ConfigCommandError> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigCommandError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    let config: SiteConfiguration = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Validate a configuration file.
///
/// # Errors
///
/// Returns an error if the file is unreadable, not a configuration document,
/// or breaks a configuration rule.
pub async fn validate(path: &Path) -> Result<(), ConfigCommandError> {
    let config = check_file(path).await?;
    info!(
        path = %path.display(),
        promos = config.promos.len(),
        videos = config.videos.len(),
        articles = config.blog.articles.len(),
        "Configuration is valid"
    );
    Ok(())
}
