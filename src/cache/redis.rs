//! Networked cache backend shared across instances.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::time::Duration;

use super::{Cache, CacheError};

/// Redis-backed cache. Expiration is enforced server-side via `SET EX`;
/// single-use consumption maps to `GETDEL`, which is atomic on the server.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Open a managed connection to the given redis URL.
    ///
    /// # Errors
    /// Fails if the URL is invalid or the initial connection cannot be
    /// established.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(|err| CacheError::Backend(err.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|err| CacheError::Backend(err.to_string()))?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        conn.get(key)
            .await
            .map_err(|err| CacheError::Backend(err.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        // SET EX wants whole seconds; round sub-second TTLs up so an entry
        // never outlives its requested lifetime by omission.
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value, seconds)
            .await
            .map_err(|err| CacheError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .del(key)
            .await
            .map_err(|err| CacheError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        redis::cmd("GETDEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|err| CacheError::Backend(err.to_string()))
    }
}
