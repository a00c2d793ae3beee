//! Key-value store backends.
//!
//! The trait works on raw bytes; typing and serialization live in
//! [`StrictCache`](crate::StrictCache).

mod memory;
mod redis;

pub use self::memory::MemoryBackend;
pub use self::redis::{create_pool, RedisBackend, RedisBackendParameters};

use crate::ttl::Expiry;
use async_trait::async_trait;
use shaku::Interface;
use std::time::Duration;
use strata_core::{HealthCheck, StrataResult};

/// Capabilities a Redis-like store must provide.
///
/// Writes that accept a `ttl` apply the value and the expiry atomically, so a
/// failed expiry never leaves a persistent entry behind.
///
/// Every backend is also a [`HealthCheck`], whose `name()` identifies it in
/// logs and health reports.
#[async_trait]
pub trait KeyValueBackend: Interface + HealthCheck {
    // Scalars and key metadata

    async fn get(&self, key: &str) -> StrataResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StrataResult<()>;

    /// Sets a TTL on an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> StrataResult<bool>;

    async fn ttl(&self, key: &str) -> StrataResult<Expiry>;

    async fn exists(&self, key: &str) -> StrataResult<bool>;

    /// Deletes keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> StrataResult<u64>;

    // Hashes

    async fn hash_put(
        &self,
        key: &str,
        fields: Vec<(String, Vec<u8>)>,
        ttl: Option<Duration>,
    ) -> StrataResult<()>;

    async fn hash_get(&self, key: &str, field: &str) -> StrataResult<Option<Vec<u8>>>;

    async fn hash_entries(&self, key: &str) -> StrataResult<Vec<(String, Vec<u8>)>>;

    async fn hash_delete(&self, key: &str, fields: &[String]) -> StrataResult<u64>;

    async fn hash_exists(&self, key: &str, field: &str) -> StrataResult<bool>;

    // Sets

    /// Adds members, returning how many were not already present.
    async fn set_add(
        &self,
        key: &str,
        members: Vec<Vec<u8>>,
        ttl: Option<Duration>,
    ) -> StrataResult<u64>;

    async fn set_remove(&self, key: &str, members: Vec<Vec<u8>>) -> StrataResult<u64>;

    async fn set_members(&self, key: &str) -> StrataResult<Vec<Vec<u8>>>;

    async fn set_size(&self, key: &str) -> StrataResult<u64>;

    async fn set_contains(&self, key: &str, member: &[u8]) -> StrataResult<bool>;

    // Lists

    /// Appends to the tail, returning the new length.
    async fn list_push(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StrataResult<u64>;

    /// Inclusive range with Redis index semantics (negative counts from the tail).
    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StrataResult<Vec<Vec<u8>>>;

    async fn list_index(&self, key: &str, index: i64) -> StrataResult<Option<Vec<u8>>>;

    async fn list_len(&self, key: &str) -> StrataResult<u64>;

    // Maintenance

    /// Returns every key matching a glob pattern (`*`, `?`).
    async fn scan(&self, pattern: &str) -> StrataResult<Vec<String>>;

    async fn ping(&self) -> StrataResult<()>;
}
