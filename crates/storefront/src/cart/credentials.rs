//! Persistence of the shopper's commerce credential.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tower_sessions::Session;

use crate::commerce::SessionCredential;
use crate::models::session::keys;

/// Credential persistence errors.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Where a shopper's credential lives between requests.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load_credential(&self) -> Result<Option<SessionCredential>, CredentialStoreError>;

    async fn save_credential(
        &self,
        credential: &SessionCredential,
    ) -> Result<(), CredentialStoreError>;
}

#[async_trait]
impl CredentialStore for Session {
    async fn load_credential(&self) -> Result<Option<SessionCredential>, CredentialStoreError> {
        Ok(self.get(keys::COMMERCE_CREDENTIAL).await?)
    }

    async fn save_credential(
        &self,
        credential: &SessionCredential,
    ) -> Result<(), CredentialStoreError> {
        self.insert(keys::COMMERCE_CREDENTIAL, credential).await?;
        Ok(())
    }
}

/// In-process credential store, for tools and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<SessionCredential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new(credential: Option<SessionCredential>) -> Self {
        Self {
            credential: Mutex::new(credential),
        }
    }

    /// The stored credential.
    #[must_use]
    pub fn current(&self) -> Option<SessionCredential> {
        self.credential
            .lock()
            .ok()
            .and_then(|credential| credential.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load_credential(&self) -> Result<Option<SessionCredential>, CredentialStoreError> {
        Ok(self.current())
    }

    async fn save_credential(
        &self,
        credential: &SessionCredential,
    ) -> Result<(), CredentialStoreError> {
        if let Ok(mut stored) = self.credential.lock() {
            *stored = Some(credential.clone());
        }
        Ok(())
    }
}
