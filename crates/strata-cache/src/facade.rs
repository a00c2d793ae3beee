//! Lenient cache facade.
//!
//! Every operation swallows backend and serialization failures, logs them
//! at `warn` (rejected arguments at `error`), and returns a neutral value
//! instead:
//!
//! | result type        | on failure |
//! |--------------------|------------|
//! | `bool`             | `false`    |
//! | count (`u64`)      | `0`        |
//! | value / collection | `None`     |
//! | `get_expire`       | [`EXPIRE_ERROR`] |
//!
//! Callers that must tell a miss from an outage use [`CacheFacade::strict`].

use crate::backend::KeyValueBackend;
use crate::serializer::{JsonSerializer, ResultSerializer};
use crate::strict::StrictCache;
use crate::ttl::{TimeUnit, Ttl, EXPIRE_ERROR};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use strata_config::RedisConfig;
use strata_core::{StrataError, StrataResult};
use tracing::{debug, error, warn};

/// Cache facade that never fails.
#[derive(Clone)]
pub struct CacheFacade<S = JsonSerializer> {
    strict: StrictCache<S>,
}

impl CacheFacade<JsonSerializer> {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::from_strict(StrictCache::new(backend))
    }

    #[must_use]
    pub fn from_config(backend: Arc<dyn KeyValueBackend>, config: &RedisConfig) -> Self {
        Self::from_strict(StrictCache::from_config(backend, config))
    }
}

impl<S: ResultSerializer> CacheFacade<S> {
    #[must_use]
    pub fn from_strict(strict: StrictCache<S>) -> Self {
        Self { strict }
    }

    /// The error-surfacing view of the same cache.
    pub fn strict(&self) -> &StrictCache<S> {
        &self.strict
    }

    #[must_use]
    pub fn into_strict(self) -> StrictCache<S> {
        self.strict
    }

    fn soften<T>(operation: &'static str, key: &str, result: StrataResult<T>, neutral: T) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                log_failure(operation, key, &err);
                neutral
            }
        }
    }

    /// Returns `true` when the backend answers a ping.
    pub async fn is_available(&self) -> bool {
        let result = self.strict.ping().await;
        Self::soften("ping", "", result.map(|()| true), false)
    }

    // ---- scalars and key metadata ----

    pub async fn set<V: Serialize + ?Sized>(&self, key: &str, value: &V, ttl: Ttl) -> bool {
        let result = self.strict.set(key, value, ttl).await;
        Self::soften("set", key, result.map(|()| true), false)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        Self::soften("get", key, self.strict.get(key).await, None)
    }

    pub async fn expire(&self, key: &str, ttl: Ttl) -> bool {
        Self::soften("expire", key, self.strict.expire(key, ttl).await, false)
    }

    /// Remaining lifetime of `key` in `unit`, rounded down.
    ///
    /// Returns [`EXPIRE_MISSING`](crate::EXPIRE_MISSING) for absent keys,
    /// [`EXPIRE_PERSISTENT`](crate::EXPIRE_PERSISTENT) for keys without a TTL
    /// and [`EXPIRE_ERROR`] when the backend call failed.
    pub async fn get_expire(&self, key: &str, unit: TimeUnit) -> i64 {
        let result = self.strict.expiry(key).await.map(|e| e.as_sentinel(unit));
        Self::soften("get_expire", key, result, EXPIRE_ERROR)
    }

    pub async fn has_key(&self, key: &str) -> bool {
        Self::soften("has_key", key, self.strict.has_key(key).await, false)
    }

    pub async fn del(&self, keys: &[&str]) -> u64 {
        match self.strict.del(keys).await {
            Ok(deleted) => deleted,
            Err(err) => {
                log_failure("del", &keys.join(","), &err);
                0
            }
        }
    }

    // ---- hashes ----

    pub async fn hmset<K, V>(&self, key: &str, fields: &HashMap<K, V>, ttl: Ttl) -> bool
    where
        K: AsRef<str>,
        V: Serialize,
    {
        let result = self.strict.hmset(key, fields, ttl).await;
        Self::soften("hmset", key, result.map(|()| true), false)
    }

    pub async fn hset<V: Serialize + ?Sized>(&self, key: &str, field: &str, value: &V, ttl: Ttl) -> bool {
        let result = self.strict.hset(key, field, value, ttl).await;
        Self::soften("hset", key, result.map(|()| true), false)
    }

    pub async fn hget<T: DeserializeOwned>(&self, key: &str, field: &str) -> Option<T> {
        Self::soften("hget", key, self.strict.hget(key, field).await, None)
    }

    pub async fn hmget<T: DeserializeOwned>(&self, key: &str) -> Option<HashMap<String, T>> {
        Self::soften("hmget", key, self.strict.hmget(key).await.map(Some), None)
    }

    pub async fn hdel(&self, key: &str, fields: &[&str]) -> u64 {
        Self::soften("hdel", key, self.strict.hdel(key, fields).await, 0)
    }

    pub async fn h_has_key(&self, key: &str, field: &str) -> bool {
        Self::soften("h_has_key", key, self.strict.h_has_key(key, field).await, false)
    }

    // ---- sets ----

    pub async fn s_get<T>(&self, key: &str) -> Option<HashSet<T>>
    where
        T: DeserializeOwned + Eq + Hash,
    {
        Self::soften("s_get", key, self.strict.s_get(key).await.map(Some), None)
    }

    pub async fn s_has_key<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> bool {
        Self::soften("s_has_key", key, self.strict.s_has_key(key, value).await, false)
    }

    pub async fn s_set<V: Serialize>(&self, key: &str, ttl: Ttl, values: &[V]) -> u64 {
        Self::soften("s_set", key, self.strict.s_set(key, ttl, values).await, 0)
    }

    pub async fn s_get_set_size(&self, key: &str) -> u64 {
        Self::soften("s_get_set_size", key, self.strict.s_get_set_size(key).await, 0)
    }

    pub async fn set_remove<V: Serialize>(&self, key: &str, values: &[V]) -> u64 {
        Self::soften("set_remove", key, self.strict.set_remove(key, values).await, 0)
    }

    // ---- lists ----

    pub async fn l_get<T: DeserializeOwned>(&self, key: &str, start: i64, end: i64) -> Option<Vec<T>> {
        Self::soften("l_get", key, self.strict.l_get(key, start, end).await.map(Some), None)
    }

    pub async fn l_get_all<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        Self::soften("l_get_all", key, self.strict.l_get_all(key).await.map(Some), None)
    }

    pub async fn l_get_list_size(&self, key: &str) -> u64 {
        Self::soften("l_get_list_size", key, self.strict.l_get_list_size(key).await, 0)
    }

    pub async fn l_get_index<T: DeserializeOwned>(&self, key: &str, index: i64) -> Option<T> {
        Self::soften("l_get_index", key, self.strict.l_get_index(key, index).await, None)
    }

    pub async fn l_set<V: Serialize + ?Sized>(&self, key: &str, value: &V, ttl: Ttl) -> bool {
        let result = self.strict.l_set(key, value, ttl).await;
        Self::soften("l_set", key, result.map(|_| true), false)
    }

    // ---- maintenance ----

    pub async fn sweep_persistent(&self, pattern: &str, ttl: Ttl) -> u64 {
        Self::soften("sweep_persistent", pattern, self.strict.sweep_persistent(pattern, ttl).await, 0)
    }

    /// Applies the configured default TTL to persistent keys matching `pattern`.
    pub async fn sweep_orphans(&self, pattern: &str) -> u64 {
        self.sweep_persistent(pattern, self.strict.default_ttl()).await
    }

    /// Returns the cached value, or loads, caches and returns it on a miss.
    ///
    /// Cache failures degrade to a load; only loader errors are returned.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, ttl: Ttl, loader: F) -> StrataResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StrataResult<T>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let value = loader().await?;

        if !self.set(key, &value, ttl).await {
            debug!("Loaded value for '{}' was not cached", key);
        }

        Ok(value)
    }

    /// [`get_or_load`](Self::get_or_load) with the configured default TTL.
    pub async fn get_or_load_default<T, F, Fut>(&self, key: &str, loader: F) -> StrataResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StrataResult<T>>,
    {
        self.get_or_load(key, self.strict.default_ttl(), loader).await
    }
}

fn log_failure(operation: &str, key: &str, err: &StrataError) {
    if err.is_backend_failure() {
        warn!(
            operation,
            key,
            error_code = err.error_code(),
            error = %err,
            "Cache operation failed; returning neutral value"
        );
    } else {
        error!(
            operation,
            key,
            error_code = err.error_code(),
            error = %err,
            "Cache operation rejected; returning neutral value"
        );
    }
}
