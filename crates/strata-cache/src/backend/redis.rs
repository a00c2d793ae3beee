//! Redis backend over a deadpool connection pool.

use super::KeyValueBackend;
use crate::ttl::Expiry;
use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands, RedisError};
use deadpool_redis::{Config, Pool, Runtime};
use shaku::Component;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strata_config::RedisConfig;
use strata_core::{HealthCheck, HealthStatus, StrataError, StrataResult};
use tracing::{debug, info};

/// Creates a Redis connection pool and verifies it with a PING.
pub async fn create_pool(config: &RedisConfig) -> StrataResult<Pool> {
    info!("Creating Redis connection pool...");

    let cfg = Config::from_url(&config.url);

    let pool = cfg
        .builder()
        .map_err(|e| StrataError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .wait_timeout(Some(config.connect_timeout()))
        .create_timeout(Some(config.connect_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| StrataError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

    let mut conn = pool.get().await.map_err(|e| {
        StrataError::BackendUnavailable(format!("Failed to get Redis connection: {}", e))
    })?;
    let _: String = redis::cmd("PING")
        .query_async(&mut *conn)
        .await
        .map_err(|e| StrataError::BackendUnavailable(format!("Redis PING failed: {}", e)))?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Redis-backed key-value store.
#[derive(Component)]
#[shaku(interface = KeyValueBackend)]
pub struct RedisBackend {
    /// Redis connection pool; `None` when the cache is disabled.
    pool: Option<Arc<Pool>>,
}

impl RedisBackend {
    /// Creates a backend over an existing pool.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Creates a backend whose every command fails with `BackendUnavailable`.
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Component parameters for wiring into a shaku module.
    #[must_use]
    pub fn parameters(pool: Option<Arc<Pool>>) -> RedisBackendParameters {
        RedisBackendParameters { pool }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn conn(&self) -> StrataResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool.get().await.map_err(|e| {
                StrataError::BackendUnavailable(format!("Failed to get Redis connection: {}", e))
            }),
            None => Err(StrataError::BackendUnavailable("Cache is disabled".to_string())),
        }
    }
}

fn command_error<'a>(command: &'a str, key: &'a str) -> impl FnOnce(RedisError) -> StrataError + 'a {
    move |e| StrataError::BackendUnavailable(format!("{} '{}' failed: {}", command, key, e))
}

fn millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1)
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn get(&self, key: &str) -> StrataResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(command_error("GET", key))?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StrataResult<()> {
        let mut conn = self.conn().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }

        let _: () = cmd.query_async(&mut *conn).await.map_err(command_error("SET", key))?;

        debug!("Cached key '{}' with TTL {:?}", key, ttl);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StrataResult<bool> {
        let mut conn = self.conn().await?;
        let applied: bool = conn
            .pexpire(key, millis(ttl))
            .await
            .map_err(command_error("PEXPIRE", key))?;
        Ok(applied)
    }

    async fn ttl(&self, key: &str) -> StrataResult<Expiry> {
        let mut conn = self.conn().await?;
        let remaining: i64 = conn.pttl(key).await.map_err(command_error("PTTL", key))?;
        Ok(Expiry::from_pttl(remaining))
    }

    async fn exists(&self, key: &str) -> StrataResult<bool> {
        let mut conn = self.conn().await?;
        let exists: bool = conn.exists(key).await.map_err(command_error("EXISTS", key))?;
        Ok(exists)
    }

    async fn delete(&self, keys: &[String]) -> StrataResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let label = keys.join(",");
        let mut conn = self.conn().await?;
        let deleted: u64 = conn.del(keys).await.map_err(command_error("DEL", &label))?;

        debug!("Deleted {} of {} keys", deleted, keys.len());
        Ok(deleted)
    }

    async fn hash_put(
        &self,
        key: &str,
        fields: Vec<(String, Vec<u8>)>,
        ttl: Option<Duration>,
    ) -> StrataResult<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().hset_multiple(key, &fields).ignore();
        if let Some(ttl) = ttl {
            pipe.pexpire(key, millis(ttl)).ignore();
        }

        let _: () = pipe.query_async(&mut *conn).await.map_err(command_error("HSET", key))?;
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> StrataResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn.hget(key, field).await.map_err(command_error("HGET", key))?;
        Ok(value)
    }

    async fn hash_entries(&self, key: &str) -> StrataResult<Vec<(String, Vec<u8>)>> {
        let mut conn = self.conn().await?;
        let entries: HashMap<String, Vec<u8>> =
            conn.hgetall(key).await.map_err(command_error("HGETALL", key))?;
        Ok(entries.into_iter().collect())
    }

    async fn hash_delete(&self, key: &str, fields: &[String]) -> StrataResult<u64> {
        if fields.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn().await?;
        let removed: u64 = conn.hdel(key, fields).await.map_err(command_error("HDEL", key))?;
        Ok(removed)
    }

    async fn hash_exists(&self, key: &str, field: &str) -> StrataResult<bool> {
        let mut conn = self.conn().await?;
        let exists: bool = conn.hexists(key, field).await.map_err(command_error("HEXISTS", key))?;
        Ok(exists)
    }

    async fn set_add(
        &self,
        key: &str,
        members: Vec<Vec<u8>>,
        ttl: Option<Duration>,
    ) -> StrataResult<u64> {
        if members.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().sadd(key, &members);
        if let Some(ttl) = ttl {
            pipe.pexpire(key, millis(ttl)).ignore();
        }

        let (added,): (u64,) = pipe.query_async(&mut *conn).await.map_err(command_error("SADD", key))?;
        Ok(added)
    }

    async fn set_remove(&self, key: &str, members: Vec<Vec<u8>>) -> StrataResult<u64> {
        if members.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn().await?;
        let removed: u64 = conn.srem(key, &members).await.map_err(command_error("SREM", key))?;
        Ok(removed)
    }

    async fn set_members(&self, key: &str) -> StrataResult<Vec<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let members: Vec<Vec<u8>> = conn.smembers(key).await.map_err(command_error("SMEMBERS", key))?;
        Ok(members)
    }

    async fn set_size(&self, key: &str) -> StrataResult<u64> {
        let mut conn = self.conn().await?;
        let size: u64 = conn.scard(key).await.map_err(command_error("SCARD", key))?;
        Ok(size)
    }

    async fn set_contains(&self, key: &str, member: &[u8]) -> StrataResult<bool> {
        let mut conn = self.conn().await?;
        let contains: bool = conn
            .sismember(key, member)
            .await
            .map_err(command_error("SISMEMBER", key))?;
        Ok(contains)
    }

    async fn list_push(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StrataResult<u64> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().rpush(key, value);
        if let Some(ttl) = ttl {
            pipe.pexpire(key, millis(ttl)).ignore();
        }

        let (len,): (u64,) = pipe.query_async(&mut *conn).await.map_err(command_error("RPUSH", key))?;
        Ok(len)
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StrataResult<Vec<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let values: Vec<Vec<u8>> = redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut *conn)
            .await
            .map_err(command_error("LRANGE", key))?;
        Ok(values)
    }

    async fn list_index(&self, key: &str, index: i64) -> StrataResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = redis::cmd("LINDEX")
            .arg(key)
            .arg(index)
            .query_async(&mut *conn)
            .await
            .map_err(command_error("LINDEX", key))?;
        Ok(value)
    }

    async fn list_len(&self, key: &str) -> StrataResult<u64> {
        let mut conn = self.conn().await?;
        let len: u64 = conn.llen(key).await.map_err(command_error("LLEN", key))?;
        Ok(len)
    }

    async fn scan(&self, pattern: &str) -> StrataResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut *conn)
                .await
                .map_err(command_error("SCAN", pattern))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();

        debug!("Scanned {} keys matching '{}'", keys.len(), pattern);
        Ok(keys)
    }

    async fn ping(&self) -> StrataResult<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(command_error("PING", ""))?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn check(&self) -> HealthStatus {
        if !self.is_enabled() {
            return HealthStatus::Degraded("cache is disabled".to_string());
        }

        match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_backend() {
        let backend = RedisBackend::disabled();
        assert!(!backend.is_enabled());
        assert_eq!(backend.name(), "redis");
    }

    #[tokio::test]
    async fn test_disabled_backend_is_unavailable() {
        let backend = RedisBackend::disabled();
        let result = backend.get("key").await;
        assert!(matches!(result, Err(StrataError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_disabled_backend_reports_degraded() {
        let backend = RedisBackend::disabled();
        assert!(matches!(backend.check().await, HealthStatus::Degraded(_)));
    }

    #[test]
    fn test_ttl_millis_never_zero() {
        assert_eq!(millis(Duration::from_micros(10)), 1);
        assert_eq!(millis(Duration::from_secs(2)), 2_000);
    }
}
