//! TTL-aware key/value cache with swappable backends.
//!
//! The backend is chosen once at process start from configuration and the
//! resulting handle is passed to every component that needs it; there is no
//! global instance and no hot-swapping. Callers namespace their keys
//! (`mfa-challenge:`, `refresh-token:`, `etl-access-token:`) so the three
//! uses never collide.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use std::{str::FromStr, sync::Arc, time::Duration};
use thiserror::Error;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or refused the operation.
    #[error("cache backend unavailable: {0}")]
    Backend(String),
}

/// Key/value store with per-entry expiration.
///
/// `get` on an expired key and `get` on a key that never existed are
/// indistinguishable: both return `None`.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically fetch and remove a key.
    ///
    /// The removal is the commit point for single-use entries (login
    /// challenges, refresh tokens): when two callers race on the same key,
    /// at most one observes `Some`.
    async fn take(&self, key: &str) -> Result<Option<String>, CacheError>;
}

/// Which backend to construct; parsed from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend: {other}")),
        }
    }
}

/// Construct the configured backend. Called exactly once per process; the
/// returned handle is shared from then on.
///
/// # Errors
/// Fails if the redis backend is selected without a URL or the initial
/// connection cannot be established.
pub async fn connect(
    backend: CacheBackend,
    redis_url: Option<&str>,
) -> Result<Arc<dyn Cache>, CacheError> {
    match backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new())),
        CacheBackend::Redis => {
            let url = redis_url
                .ok_or_else(|| CacheError::Backend("redis backend requires a URL".to_string()))?;
            Ok(Arc::new(RedisCache::connect(url).await?))
        }
    }
}
