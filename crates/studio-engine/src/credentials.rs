use std::sync::{Arc, PoisonError, RwLock};

use anyhow::bail;
use async_trait::async_trait;

use crate::non_empty_env;

/// Source of the API credential, and the hook that obtains a fresh one.
///
/// `request_credential` may be called concurrently by different operations.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    fn has_credential(&self) -> bool;
    async fn request_credential(&self) -> anyhow::Result<()>;
}

/// Shared slot for the backend API key. Clones see the same key.
#[derive(Clone, Default)]
pub struct ApiKeyStore {
    key: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for ApiKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyStore")
            .field("key", &self.get().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiKeyStore {
    pub fn new(key: Option<String>) -> Self {
        let store = Self::default();
        if let Some(key) = key {
            store.set(key);
        }
        store
    }

    pub fn from_env() -> Self {
        Self::new(env_api_key())
    }

    pub fn get(&self) -> Option<String> {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores a trimmed key. Blank input is ignored.
    pub fn set(&self, key: impl Into<String>) {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return;
        }
        *self.key.write().unwrap_or_else(PoisonError::into_inner) = Some(key);
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

/// Re-reading the environment is the only way a bare store can pick up a
/// new key.
#[async_trait]
impl CredentialProvider for ApiKeyStore {
    fn has_credential(&self) -> bool {
        self.is_set()
    }

    async fn request_credential(&self) -> anyhow::Result<()> {
        match env_api_key() {
            Some(key) => {
                self.set(key);
                Ok(())
            }
            None => bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set"),
        }
    }
}

fn env_api_key() -> Option<String> {
    non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
}
