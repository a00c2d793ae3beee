//! Common test infrastructure for cache integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata_cache::{CacheFacade, Expiry, KeyValueBackend, MemoryBackend, StrictCache};
use strata_core::{HealthCheck, HealthStatus, StrataError, StrataResult};

/// How a [`BrokenBackend`] misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Every command fails immediately with `BackendUnavailable`.
    Refused,
    /// Every command hangs far beyond any reasonable deadline.
    Stalled,
}

/// Backend that never succeeds; counts the commands it receives.
pub struct BrokenBackend {
    failure: Failure,
    calls: AtomicUsize,
}

impl BrokenBackend {
    pub fn new(failure: Failure) -> Self {
        Self {
            failure,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn fail<T>(&self) -> StrataResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Failure::Stalled = self.failure {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Err(StrataError::backend("connection refused"))
    }
}

#[async_trait]
impl HealthCheck for BrokenBackend {
    fn name(&self) -> &str {
        "broken"
    }

    async fn check(&self) -> HealthStatus {
        HealthStatus::Unhealthy("connection refused".to_string())
    }
}

#[async_trait]
impl KeyValueBackend for BrokenBackend {
    async fn get(&self, _key: &str) -> StrataResult<Option<Vec<u8>>> {
        self.fail().await
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> StrataResult<()> {
        self.fail().await
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> StrataResult<bool> {
        self.fail().await
    }

    async fn ttl(&self, _key: &str) -> StrataResult<Expiry> {
        self.fail().await
    }

    async fn exists(&self, _key: &str) -> StrataResult<bool> {
        self.fail().await
    }

    async fn delete(&self, _keys: &[String]) -> StrataResult<u64> {
        self.fail().await
    }

    async fn hash_put(
        &self,
        _key: &str,
        _fields: Vec<(String, Vec<u8>)>,
        _ttl: Option<Duration>,
    ) -> StrataResult<()> {
        self.fail().await
    }

    async fn hash_get(&self, _key: &str, _field: &str) -> StrataResult<Option<Vec<u8>>> {
        self.fail().await
    }

    async fn hash_entries(&self, _key: &str) -> StrataResult<Vec<(String, Vec<u8>)>> {
        self.fail().await
    }

    async fn hash_delete(&self, _key: &str, _fields: &[String]) -> StrataResult<u64> {
        self.fail().await
    }

    async fn hash_exists(&self, _key: &str, _field: &str) -> StrataResult<bool> {
        self.fail().await
    }

    async fn set_add(
        &self,
        _key: &str,
        _members: Vec<Vec<u8>>,
        _ttl: Option<Duration>,
    ) -> StrataResult<u64> {
        self.fail().await
    }

    async fn set_remove(&self, _key: &str, _members: Vec<Vec<u8>>) -> StrataResult<u64> {
        self.fail().await
    }

    async fn set_members(&self, _key: &str) -> StrataResult<Vec<Vec<u8>>> {
        self.fail().await
    }

    async fn set_size(&self, _key: &str) -> StrataResult<u64> {
        self.fail().await
    }

    async fn set_contains(&self, _key: &str, _member: &[u8]) -> StrataResult<bool> {
        self.fail().await
    }

    async fn list_push(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> StrataResult<u64> {
        self.fail().await
    }

    async fn list_range(&self, _key: &str, _start: i64, _stop: i64) -> StrataResult<Vec<Vec<u8>>> {
        self.fail().await
    }

    async fn list_index(&self, _key: &str, _index: i64) -> StrataResult<Option<Vec<u8>>> {
        self.fail().await
    }

    async fn list_len(&self, _key: &str) -> StrataResult<u64> {
        self.fail().await
    }

    async fn scan(&self, _pattern: &str) -> StrataResult<Vec<String>> {
        self.fail().await
    }

    async fn ping(&self) -> StrataResult<()> {
        self.fail().await
    }
}

/// A lenient cache over a fresh in-memory backend.
pub fn memory_cache() -> (Arc<MemoryBackend>, CacheFacade) {
    let backend = Arc::new(MemoryBackend::new());
    (backend.clone(), CacheFacade::new(backend))
}

/// A strict cache over a fresh in-memory backend.
pub fn strict_memory_cache() -> (Arc<MemoryBackend>, StrictCache) {
    let backend = Arc::new(MemoryBackend::new());
    (backend.clone(), StrictCache::new(backend))
}

/// A lenient cache whose backend always refuses.
pub fn refusing_cache() -> (Arc<BrokenBackend>, CacheFacade) {
    let backend = Arc::new(BrokenBackend::new(Failure::Refused));
    (backend.clone(), CacheFacade::new(backend))
}
