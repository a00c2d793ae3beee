//! Capability traits implemented by external collaborators.

use crate::{PageParams, PageWindow, StrataResult};
use async_trait::async_trait;

/// Persistence capability used to fill a [`Pagination`](crate::Pagination).
///
/// Implemented by the repository layer; the mapper or query behind it is
/// opaque to Strata.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Counts all rows matching the criteria.
    async fn count(&self, params: &PageParams) -> StrataResult<u64>;

    /// Fetches the rows of one window.
    async fn fetch(&self, params: &PageParams, window: &PageWindow) -> StrataResult<Vec<T>>;
}

/// Trait for health checks.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Returns the name of this health check.
    fn name(&self) -> &str;

    /// Performs the health check.
    async fn check(&self) -> HealthStatus;
}

/// Health check status.
#[derive(Debug, Clone)]
pub enum HealthStatus {
    /// The component is healthy.
    Healthy,
    /// The component is degraded but functional.
    Degraded(String),
    /// The component is unhealthy.
    Unhealthy(String),
}

impl HealthStatus {
    /// Returns true if the status is healthy.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Returns true if the status is unhealthy.
    #[must_use]
    pub const fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}
