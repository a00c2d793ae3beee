//! # Strata Cache
//!
//! Typed cache facade over a Redis-like key-value store.
//!
//! - [`CacheFacade`]: lenient operations that log failures and return
//!   neutral values
//! - [`StrictCache`]: the same operations returning `StrataResult`
//! - [`KeyValueBackend`]: the store capability, implemented by
//!   [`RedisBackend`] and [`MemoryBackend`]
//! - [`ResultSerializer`]: the value wire format, JSON by default

pub mod backend;
mod facade;
mod keys;
mod module;
mod serializer;
mod strict;
mod ttl;

pub use backend::{create_pool, KeyValueBackend, MemoryBackend, RedisBackend, RedisBackendParameters};
pub use facade::CacheFacade;
pub use keys::CacheKeys;
pub use module::{build_cache_module, cache_facade, CacheModule};
pub use serializer::{JsonSerializer, ResultSerializer};
pub use strict::{StrictCache, DEFAULT_COMMAND_TIMEOUT, DEFAULT_TTL};
pub use ttl::{Expiry, TimeUnit, Ttl, EXPIRE_ERROR, EXPIRE_MISSING, EXPIRE_PERSISTENT};
