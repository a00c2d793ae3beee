//! Typed cache operations that surface every failure.

use crate::backend::KeyValueBackend;
use crate::keys::CacheKeys;
use crate::serializer::{JsonSerializer, ResultSerializer};
use crate::ttl::{Expiry, Ttl};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use strata_config::RedisConfig;
use strata_core::{StrataError, StrataResult};
use tracing::{debug, info};

/// Default per-command deadline.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Default TTL for cache-aside loads and orphan sweeps (5 minutes).
pub const DEFAULT_TTL: Ttl = Ttl::seconds(300);

/// Typed facade over a [`KeyValueBackend`] returning `StrataResult` from
/// every operation.
///
/// Keys are qualified with the configured namespace, values go through the
/// serializer `S`, and each backend command runs under a deadline that
/// fails with [`StrataError::Timeout`].
///
/// Set members and list items are compared by their encoded bytes, so
/// values stored in sets should serialize deterministically.
#[derive(Clone)]
pub struct StrictCache<S = JsonSerializer> {
    backend: Arc<dyn KeyValueBackend>,
    serializer: S,
    keys: CacheKeys,
    command_timeout: Duration,
    default_ttl: Ttl,
}

impl StrictCache<JsonSerializer> {
    /// Creates a JSON cache without namespace and with the default deadline.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            serializer: JsonSerializer,
            keys: CacheKeys::default(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Creates a JSON cache using the namespace and deadline from config.
    #[must_use]
    pub fn from_config(backend: Arc<dyn KeyValueBackend>, config: &RedisConfig) -> Self {
        Self::new(backend)
            .with_prefix(config.key_prefix.as_deref())
            .with_command_timeout(config.command_timeout())
            .with_default_ttl(Ttl::from(config.default_ttl()))
    }
}

impl<S: ResultSerializer> StrictCache<S> {
    /// Replaces the value serializer.
    #[must_use]
    pub fn with_serializer<T: ResultSerializer>(self, serializer: T) -> StrictCache<T> {
        StrictCache {
            backend: self.backend,
            serializer,
            keys: self.keys,
            command_timeout: self.command_timeout,
            default_ttl: self.default_ttl,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.keys = CacheKeys::new(prefix);
        self
    }

    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Ttl) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// TTL configured for cache-aside loads and sweeps.
    pub fn default_ttl(&self) -> Ttl {
        self.default_ttl
    }

    async fn run<T>(
        &self,
        operation: &'static str,
        key: &str,
        call: impl Future<Output = StrataResult<T>>,
    ) -> StrataResult<T> {
        match tokio::time::timeout(self.command_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StrataError::Timeout(format!(
                "{} '{}' exceeded {}ms",
                operation,
                key,
                self.command_timeout.as_millis()
            ))),
        }
    }

    fn encode_all<V: Serialize>(&self, values: &[V]) -> StrataResult<Vec<Vec<u8>>> {
        values.iter().map(|v| self.serializer.encode(v)).collect()
    }

    /// Checks the backend is reachable.
    pub async fn ping(&self) -> StrataResult<()> {
        self.run("ping", "", self.backend.ping()).await
    }

    // ---- scalars and key metadata ----

    /// Stores a value with a TTL in one atomic command.
    pub async fn set<V: Serialize + ?Sized>(&self, key: &str, value: &V, ttl: Ttl) -> StrataResult<()> {
        let ttl = positive(ttl)?;
        let bytes = self.serializer.encode(value)?;
        let key = self.keys.key(key);
        self.run("set", &key, self.backend.set(&key, bytes, Some(ttl))).await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StrataResult<Option<T>> {
        let key = self.keys.key(key);
        let bytes = self.run("get", &key, self.backend.get(&key)).await?;
        bytes.map(|b| self.serializer.decode(&b)).transpose()
    }

    /// Sets a TTL on an existing key. Returns `false` if the key is absent.
    pub async fn expire(&self, key: &str, ttl: Ttl) -> StrataResult<bool> {
        let ttl = positive(ttl)?;
        let key = self.keys.key(key);
        self.run("expire", &key, self.backend.expire(&key, ttl)).await
    }

    /// Remaining lifetime of a key.
    pub async fn expiry(&self, key: &str) -> StrataResult<Expiry> {
        let key = self.keys.key(key);
        self.run("expiry", &key, self.backend.ttl(&key)).await
    }

    pub async fn has_key(&self, key: &str) -> StrataResult<bool> {
        let key = self.keys.key(key);
        self.run("has_key", &key, self.backend.exists(&key)).await
    }

    /// Deletes keys, returning how many existed. An empty slice is a no-op.
    pub async fn del(&self, keys: &[&str]) -> StrataResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let qualified: Vec<String> = keys.iter().map(|k| self.keys.key(k)).collect();
        let label = qualified.join(",");
        self.run("del", &label, self.backend.delete(&qualified)).await
    }

    // ---- hashes ----

    /// Writes every field of `fields` and applies the TTL atomically.
    ///
    /// An empty map writes nothing.
    pub async fn hmset<K, V>(&self, key: &str, fields: &HashMap<K, V>, ttl: Ttl) -> StrataResult<()>
    where
        K: AsRef<str>,
        V: Serialize,
    {
        let ttl = positive(ttl)?;
        let encoded = fields
            .iter()
            .map(|(field, value)| Ok((field.as_ref().to_string(), self.serializer.encode(value)?)))
            .collect::<StrataResult<Vec<_>>>()?;

        let key = self.keys.key(key);
        self.run("hmset", &key, self.backend.hash_put(&key, encoded, Some(ttl))).await
    }

    pub async fn hset<V: Serialize + ?Sized>(
        &self,
        key: &str,
        field: &str,
        value: &V,
        ttl: Ttl,
    ) -> StrataResult<()> {
        let ttl = positive(ttl)?;
        let encoded = vec![(field.to_string(), self.serializer.encode(value)?)];
        let key = self.keys.key(key);
        self.run("hset", &key, self.backend.hash_put(&key, encoded, Some(ttl))).await
    }

    pub async fn hget<T: DeserializeOwned>(&self, key: &str, field: &str) -> StrataResult<Option<T>> {
        let key = self.keys.key(key);
        let bytes = self.run("hget", &key, self.backend.hash_get(&key, field)).await?;
        bytes.map(|b| self.serializer.decode(&b)).transpose()
    }

    /// Reads a whole hash. A missing key yields an empty map.
    pub async fn hmget<T: DeserializeOwned>(&self, key: &str) -> StrataResult<HashMap<String, T>> {
        let key = self.keys.key(key);
        let entries = self.run("hmget", &key, self.backend.hash_entries(&key)).await?;
        entries
            .into_iter()
            .map(|(field, bytes)| Ok((field, self.serializer.decode(&bytes)?)))
            .collect()
    }

    pub async fn hdel(&self, key: &str, fields: &[&str]) -> StrataResult<u64> {
        if fields.is_empty() {
            return Ok(0);
        }

        let fields: Vec<String> = fields.iter().map(|f| (*f).to_string()).collect();
        let key = self.keys.key(key);
        self.run("hdel", &key, self.backend.hash_delete(&key, &fields)).await
    }

    pub async fn h_has_key(&self, key: &str, field: &str) -> StrataResult<bool> {
        let key = self.keys.key(key);
        self.run("h_has_key", &key, self.backend.hash_exists(&key, field)).await
    }

    // ---- sets ----

    /// Reads all members of a set. A missing key yields an empty set.
    pub async fn s_get<T>(&self, key: &str) -> StrataResult<HashSet<T>>
    where
        T: DeserializeOwned + Eq + Hash,
    {
        let key = self.keys.key(key);
        let members = self.run("s_get", &key, self.backend.set_members(&key)).await?;
        members.iter().map(|b| self.serializer.decode(b)).collect()
    }

    pub async fn s_has_key<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> StrataResult<bool> {
        let member = self.serializer.encode(value)?;
        let key = self.keys.key(key);
        self.run("s_has_key", &key, self.backend.set_contains(&key, &member)).await
    }

    /// Adds members and applies the TTL atomically, returning how many were new.
    ///
    /// No values means no write and a count of zero.
    pub async fn s_set<V: Serialize>(&self, key: &str, ttl: Ttl, values: &[V]) -> StrataResult<u64> {
        let ttl = positive(ttl)?;
        if values.is_empty() {
            return Ok(0);
        }

        let members = self.encode_all(values)?;
        let key = self.keys.key(key);
        self.run("s_set", &key, self.backend.set_add(&key, members, Some(ttl))).await
    }

    pub async fn s_get_set_size(&self, key: &str) -> StrataResult<u64> {
        let key = self.keys.key(key);
        self.run("s_get_set_size", &key, self.backend.set_size(&key)).await
    }

    /// Removes members, returning how many were present.
    pub async fn set_remove<V: Serialize>(&self, key: &str, values: &[V]) -> StrataResult<u64> {
        if values.is_empty() {
            return Ok(0);
        }

        let members = self.encode_all(values)?;
        let key = self.keys.key(key);
        self.run("set_remove", &key, self.backend.set_remove(&key, members)).await
    }

    // ---- lists ----

    /// Reads an inclusive index range; negative indices count from the tail.
    pub async fn l_get<T: DeserializeOwned>(&self, key: &str, start: i64, end: i64) -> StrataResult<Vec<T>> {
        let key = self.keys.key(key);
        let items = self.run("l_get", &key, self.backend.list_range(&key, start, end)).await?;
        items.iter().map(|b| self.serializer.decode(b)).collect()
    }

    pub async fn l_get_all<T: DeserializeOwned>(&self, key: &str) -> StrataResult<Vec<T>> {
        self.l_get(key, 0, -1).await
    }

    pub async fn l_get_list_size(&self, key: &str) -> StrataResult<u64> {
        let key = self.keys.key(key);
        self.run("l_get_list_size", &key, self.backend.list_len(&key)).await
    }

    pub async fn l_get_index<T: DeserializeOwned>(&self, key: &str, index: i64) -> StrataResult<Option<T>> {
        let key = self.keys.key(key);
        let bytes = self.run("l_get_index", &key, self.backend.list_index(&key, index)).await?;
        bytes.map(|b| self.serializer.decode(&b)).transpose()
    }

    /// Appends to the tail and applies the TTL atomically, returning the new length.
    pub async fn l_set<V: Serialize + ?Sized>(&self, key: &str, value: &V, ttl: Ttl) -> StrataResult<u64> {
        let ttl = positive(ttl)?;
        let bytes = self.serializer.encode(value)?;
        let key = self.keys.key(key);
        self.run("l_set", &key, self.backend.list_push(&key, bytes, Some(ttl))).await
    }

    // ---- maintenance ----

    /// Applies `ttl` to every key matching `pattern` that has no expiry.
    ///
    /// Returns the number of keys reconciled. The pattern is qualified with
    /// the namespace like any other key.
    pub async fn sweep_persistent(&self, pattern: &str, ttl: Ttl) -> StrataResult<u64> {
        let ttl = positive(ttl)?;
        let pattern = self.keys.pattern(pattern);
        let candidates = self.run("sweep", &pattern, self.backend.scan(&pattern)).await?;

        let mut reconciled = 0;
        for key in &candidates {
            if self.run("sweep", key, self.backend.ttl(key)).await? != Expiry::Persistent {
                continue;
            }
            if self.run("sweep", key, self.backend.expire(key, ttl)).await? {
                debug!("Applied TTL {:?} to persistent key '{}'", ttl, key);
                reconciled += 1;
            }
        }

        info!(
            pattern = %pattern,
            scanned = candidates.len(),
            reconciled,
            "Swept persistent cache entries"
        );
        Ok(reconciled)
    }
}

fn positive(ttl: Ttl) -> StrataResult<Duration> {
    if ttl.is_zero() {
        return Err(StrataError::invalid_argument("TTL must be positive"));
    }
    Ok(ttl.as_duration())
}
