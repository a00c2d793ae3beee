//! Application configuration structures.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use strata_core::telemetry::TelemetryConfig;
use strata_core::{Pagination, DEFAULT_PAGE_SIZE};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Redis configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Pagination defaults.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: TelemetryConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "strata".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL (host, port, credentials and database).
    pub url: String,
    /// Enable Redis (can be disabled for local development).
    pub enabled: bool,
    /// Connection pool size.
    pub pool_size: usize,
    /// Timeout for acquiring a pooled connection, in seconds.
    pub connect_timeout_secs: u64,
    /// Deadline for a single cache command, in milliseconds.
    pub command_timeout_ms: u64,
    /// Namespace prepended to every key as `{prefix}:{key}`.
    pub key_prefix: Option<String>,
    /// TTL used by the orphan sweep and cache-aside loads, in seconds.
    pub default_ttl_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            enabled: true,
            pool_size: 10,
            connect_timeout_secs: 5,
            command_timeout_ms: 2000,
            key_prefix: None,
            default_ttl_secs: 300, // 5 minutes
        }
    }
}

impl RedisConfig {
    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the per-command deadline as a Duration.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Returns the default TTL as a Duration.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

/// Pagination defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the request does not name one.
    pub default_page_size: u32,
    /// Largest page size a request may ask for.
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 1000,
        }
    }
}

impl PaginationConfig {
    /// Clamps a requested page size into `[1, max_page_size]`, falling back
    /// to the default when none was requested.
    ///
    /// The result is positive even when the bounds themselves are zero.
    #[must_use]
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        self.bounded_page_size(requested).get()
    }

    /// Creates an empty pagination on page 1 using the default page size.
    #[must_use]
    pub fn pagination<T>(&self) -> Pagination<T> {
        Pagination::with_page_size(self.bounded_page_size(None))
    }

    fn bounded_page_size(&self, requested: Option<u32>) -> NonZeroU32 {
        let size = requested
            .filter(|size| *size > 0)
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1));
        NonZeroU32::new(size).unwrap_or(NonZeroU32::MIN)
    }
}
