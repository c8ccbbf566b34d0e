use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use lru::LruCache;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::types::{Credential, ServiceInstance};
use crate::services::errors::MigrationError;

const CACHE_CAPACITY: usize = 64;

/// Resolves the API key for an instance
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, instance: &ServiceInstance) -> Result<Credential, MigrationError>;
}

/// Where a key comes from in the run file
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    Inline(String),
    /// Name of an environment variable holding the key
    Env(String),
}

/// Keys supplied up front, either inline or through environment variables
#[derive(Debug, Default, Clone)]
pub struct StaticCredentialResolver {
    keys: HashMap<String, KeySource>,
}

impl StaticCredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, instance: &ServiceInstance, source: KeySource) -> Self {
        self.keys.insert(instance.id(), source);
        self
    }
}

#[async_trait]
impl CredentialResolver for StaticCredentialResolver {
    async fn resolve(&self, instance: &ServiceInstance) -> Result<Credential, MigrationError> {
        let source = self
            .keys
            .get(&instance.id())
            .ok_or_else(|| MigrationError::AuthResolution {
                instance: instance.to_string(),
                message: "no key configured for this instance".to_string(),
            })?;

        let key = match source {
            KeySource::Inline(key) => key.clone(),
            KeySource::Env(var) => {
                std::env::var(var).map_err(|e| MigrationError::AuthResolution {
                    instance: instance.to_string(),
                    message: format!("cannot read key from ${}: {}", var, e),
                })?
            }
        };

        if key.trim().is_empty() {
            return Err(MigrationError::AuthResolution {
                instance: instance.to_string(),
                message: "configured key is empty".to_string(),
            });
        }

        Ok(Credential::new(key))
    }
}

/// Resolves each instance at most once per run
pub struct CachedCredentialResolver<R> {
    inner: R,
    cache: Mutex<LruCache<String, Credential>>,
}

impl<R: CredentialResolver> CachedCredentialResolver<R> {
    pub fn new(inner: R) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl<R: CredentialResolver> CredentialResolver for CachedCredentialResolver<R> {
    async fn resolve(&self, instance: &ServiceInstance) -> Result<Credential, MigrationError> {
        let key = instance.id();

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(credential) = cache.get(&key) {
                debug!("Using cached credential for {}", instance);
                return Ok(credential.clone());
            }
        }

        info!("Resolving credential for {}", instance);
        let credential = self.inner.resolve(instance).await.inspect_err(|e| {
            warn!("Credential resolution failed for {}: {}", instance, e);
        })?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, credential.clone());
        }

        Ok(credential)
    }
}
