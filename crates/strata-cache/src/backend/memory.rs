//! In-process backend with lazy expiry.
//!
//! Mirrors the Redis data model closely enough for local development and
//! tests: typed entries, `WRONGTYPE` errors, empty collections removing
//! their key, and Redis list index normalization.

use super::KeyValueBackend;
use crate::keys::glob_match;
use crate::ttl::Expiry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use strata_core::{HealthCheck, HealthStatus, StrataError, StrataResult};

#[derive(Debug, Clone)]
enum Value {
    Scalar(Vec<u8>),
    Hash(HashMap<String, Vec<u8>>),
    Set(HashSet<Vec<u8>>),
    List(Vec<Vec<u8>>),
}

impl Value {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "string",
            Self::Hash(_) => "hash",
            Self::Set(_) => "set",
            Self::List(_) => "list",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Hash(fields) => fields.is_empty(),
            Self::Set(members) => members.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Expiry instant for `ttl` from `now`; a TTL past the clock's range never expires.
fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    now.checked_add(ttl)
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> StrataError {
    StrataError::InvalidArgument(format!(
        "WRONGTYPE key '{}' holds a {}, not a {}",
        key,
        found.kind(),
        expected
    ))
}

/// Maps an inclusive Redis range onto slice bounds.
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }
    Some((usize::try_from(start).ok()?, usize::try_from(stop).ok()?))
}

/// Hash-map backed store for tests and cache-less deployments.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| !e.is_expired(now)).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` on the live entry for `key`, purging it first if expired.
    fn with_entry<R>(&self, key: &str, f: impl FnOnce(Option<&mut Entry>) -> R) -> R {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        f(entries.get_mut(key))
    }

    /// Gets or creates a collection entry, applying `ttl` when given.
    fn upsert<R>(
        &self,
        key: &str,
        empty: impl FnOnce() -> Value,
        ttl: Option<Duration>,
        f: impl FnOnce(&mut Value) -> StrataResult<R>,
    ) -> StrataResult<R> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: empty(),
            expires_at: None,
        });
        let result = f(&mut entry.value);

        if entry.value.is_empty() {
            entries.remove(key);
        } else if result.is_ok() {
            if let Some(ttl) = ttl {
                entry.expires_at = deadline(now, ttl);
            }
        }
        result
    }

    /// Mutates an existing collection, removing the key once it is empty.
    fn update<R: Default>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Value) -> StrataResult<R>,
    ) -> StrataResult<R> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }

        let Some(entry) = entries.get_mut(key) else {
            return Ok(R::default());
        };
        let result = f(&mut entry.value);
        if entry.value.is_empty() {
            entries.remove(key);
        }
        result
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> StrataResult<Option<Vec<u8>>> {
        self.with_entry(key, |entry| match entry {
            None => Ok(None),
            Some(Entry { value: Value::Scalar(bytes), .. }) => Ok(Some(bytes.clone())),
            Some(entry) => Err(wrong_type(key, "string", &entry.value)),
        })
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StrataResult<()> {
        let entry = Entry {
            value: Value::Scalar(value),
            expires_at: ttl.and_then(|ttl| deadline(Instant::now(), ttl)),
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StrataResult<bool> {
        Ok(self.with_entry(key, |entry| match entry {
            Some(entry) => {
                entry.expires_at = deadline(Instant::now(), ttl);
                true
            }
            None => false,
        }))
    }

    async fn ttl(&self, key: &str) -> StrataResult<Expiry> {
        Ok(self.with_entry(key, |entry| match entry {
            None => Expiry::Missing,
            Some(Entry { expires_at: None, .. }) => Expiry::Persistent,
            Some(Entry { expires_at: Some(at), .. }) => {
                Expiry::Remaining(at.saturating_duration_since(Instant::now()))
            }
        }))
    }

    async fn exists(&self, key: &str) -> StrataResult<bool> {
        Ok(self.with_entry(key, |entry| entry.is_some()))
    }

    async fn delete(&self, keys: &[String]) -> StrataResult<u64> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let mut deleted = 0;
        for key in keys {
            if let Some(entry) = entries.remove(key) {
                if !entry.is_expired(now) {
                    deleted += 1;
                }
            }
        }
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

        self.upsert(key, || Value::Hash(HashMap::new()), ttl, |value| match value {
            Value::Hash(map) => {
                map.extend(fields);
                Ok(())
            }
            other => Err(wrong_type(key, "hash", other)),
        })
    }

    async fn hash_get(&self, key: &str, field: &str) -> StrataResult<Option<Vec<u8>>> {
        self.with_entry(key, |entry| match entry {
            None => Ok(None),
            Some(Entry { value: Value::Hash(map), .. }) => Ok(map.get(field).cloned()),
            Some(entry) => Err(wrong_type(key, "hash", &entry.value)),
        })
    }

    async fn hash_entries(&self, key: &str) -> StrataResult<Vec<(String, Vec<u8>)>> {
        self.with_entry(key, |entry| match entry {
            None => Ok(Vec::new()),
            Some(Entry { value: Value::Hash(map), .. }) => {
                Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
            Some(entry) => Err(wrong_type(key, "hash", &entry.value)),
        })
    }

    async fn hash_delete(&self, key: &str, fields: &[String]) -> StrataResult<u64> {
        self.update(key, |value| match value {
            Value::Hash(map) => Ok(fields.iter().filter(|f| map.remove(*f).is_some()).count() as u64),
            other => Err(wrong_type(key, "hash", other)),
        })
    }

    async fn hash_exists(&self, key: &str, field: &str) -> StrataResult<bool> {
        self.with_entry(key, |entry| match entry {
            None => Ok(false),
            Some(Entry { value: Value::Hash(map), .. }) => Ok(map.contains_key(field)),
            Some(entry) => Err(wrong_type(key, "hash", &entry.value)),
        })
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

        self.upsert(key, || Value::Set(HashSet::new()), ttl, |value| match value {
            Value::Set(set) => Ok(members.into_iter().filter(|m| set.insert(m.clone())).count() as u64),
            other => Err(wrong_type(key, "set", other)),
        })
    }

    async fn set_remove(&self, key: &str, members: Vec<Vec<u8>>) -> StrataResult<u64> {
        self.update(key, |value| match value {
            Value::Set(set) => Ok(members.iter().filter(|m| set.remove(*m)).count() as u64),
            other => Err(wrong_type(key, "set", other)),
        })
    }

    async fn set_members(&self, key: &str) -> StrataResult<Vec<Vec<u8>>> {
        self.with_entry(key, |entry| match entry {
            None => Ok(Vec::new()),
            Some(Entry { value: Value::Set(set), .. }) => Ok(set.iter().cloned().collect()),
            Some(entry) => Err(wrong_type(key, "set", &entry.value)),
        })
    }

    async fn set_size(&self, key: &str) -> StrataResult<u64> {
        self.with_entry(key, |entry| match entry {
            None => Ok(0),
            Some(Entry { value: Value::Set(set), .. }) => Ok(set.len() as u64),
            Some(entry) => Err(wrong_type(key, "set", &entry.value)),
        })
    }

    async fn set_contains(&self, key: &str, member: &[u8]) -> StrataResult<bool> {
        self.with_entry(key, |entry| match entry {
            None => Ok(false),
            Some(Entry { value: Value::Set(set), .. }) => Ok(set.contains(member)),
            Some(entry) => Err(wrong_type(key, "set", &entry.value)),
        })
    }

    async fn list_push(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StrataResult<u64> {
        self.upsert(key, || Value::List(Vec::new()), ttl, |entry| match entry {
            Value::List(items) => {
                items.push(value);
                Ok(items.len() as u64)
            }
            other => Err(wrong_type(key, "list", other)),
        })
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StrataResult<Vec<Vec<u8>>> {
        self.with_entry(key, |entry| match entry {
            None => Ok(Vec::new()),
            Some(Entry { value: Value::List(items), .. }) => {
                Ok(match normalize_range(items.len(), start, stop) {
                    Some((from, to)) => items[from..=to].to_vec(),
                    None => Vec::new(),
                })
            }
            Some(entry) => Err(wrong_type(key, "list", &entry.value)),
        })
    }

    async fn list_index(&self, key: &str, index: i64) -> StrataResult<Option<Vec<u8>>> {
        self.with_entry(key, |entry| match entry {
            None => Ok(None),
            Some(Entry { value: Value::List(items), .. }) => {
                Ok(normalize_range(items.len(), index, index).map(|(at, _)| items[at].clone()))
            }
            Some(entry) => Err(wrong_type(key, "list", &entry.value)),
        })
    }

    async fn list_len(&self, key: &str) -> StrataResult<u64> {
        self.with_entry(key, |entry| match entry {
            None => Ok(0),
            Some(Entry { value: Value::List(items), .. }) => Ok(items.len() as u64),
            Some(entry) => Err(wrong_type(key, "list", &entry.value)),
        })
    }

    async fn scan(&self, pattern: &str) -> StrataResult<Vec<String>> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));

        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> StrataResult<()> {
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}
