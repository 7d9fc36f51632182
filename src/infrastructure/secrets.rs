//! Secret lookup with a bounded, expiring cache.
//!
//! Secrets are fetched by name from a [`SecretSource`] and kept for a TTL so
//! that a rotated value is picked up without a restart. Entries can also be
//! dropped explicitly, e.g. when the upstream rejects the current secret.

use async_trait::async_trait;
use dashmap::DashMap;
use secrecy::SecretString;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_MAX_ENTRIES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// The source has no value under this name
    Missing(String),
    /// The source could not be queried
    Source(String),
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretError::Missing(name) => write!(f, "Secret '{}' not found", name),
            SecretError::Source(msg) => write!(f, "Secret source error: {}", msg),
        }
    }
}

impl std::error::Error for SecretError {}

#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<Option<String>, SecretError>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretSource;

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn fetch(&self, name: &str) -> Result<Option<String>, SecretError> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(SecretError::Source(format!("{}: {}", name, e))),
        }
    }
}

struct CacheEntry {
    value: Arc<SecretString>,
    fetched_at: Instant,
}

pub struct SecretCache {
    source: Arc<dyn SecretSource>,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl SecretCache {
    pub fn new(source: Arc<dyn SecretSource>, ttl: Duration) -> Self {
        Self {
            source,
            entries: DashMap::new(),
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub async fn get(&self, name: &str) -> Result<Arc<SecretString>, SecretError> {
        let cached = self
            .entries
            .get(name)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone());
        if let Some(value) = cached {
            return Ok(value);
        }

        tracing::debug!("Secret cache miss for {}", name);
        let value = self
            .source
            .fetch(name)
            .await?
            .ok_or_else(|| SecretError::Missing(name.to_string()))?;
        let value = Arc::new(SecretString::new(value));

        if !self.entries.contains_key(name) && self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            name.to_string(),
            CacheEntry {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(value)
    }

    pub fn invalidate(&self, name: &str) {
        if self.entries.remove(name).is_some() {
            tracing::info!("Invalidated cached secret {}", name);
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.fetched_at)
            .map(|entry| entry.key().clone());
        if let Some(name) = oldest {
            self.entries.remove(&name);
        }
    }
}

impl fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("SecretCache")
            .field("cached", &names)
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}
