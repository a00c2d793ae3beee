//! Dependency injection wiring for the cache backend.

use crate::backend::{create_pool, KeyValueBackend, RedisBackend};
use crate::facade::CacheFacade;
use shaku::{module, HasComponent};
use std::sync::Arc;
use strata_config::RedisConfig;
use strata_core::StrataResult;
use tracing::info;

// Cache module holding the Redis key-value backend.
module! {
    pub CacheModule {
        components = [RedisBackend],
        providers = [],
    }
}

/// Builds the cache module, connecting to Redis when it is enabled.
///
/// A disabled configuration yields a backend whose commands fail with
/// `BackendUnavailable`, which the lenient facade turns into neutral values.
pub async fn build_cache_module(config: &RedisConfig) -> StrataResult<Arc<CacheModule>> {
    let pool = if config.enabled {
        Some(Arc::new(create_pool(config).await?))
    } else {
        info!("Redis is disabled; cache commands will report the backend as unavailable");
        None
    };

    let module = CacheModule::builder()
        .with_component_parameters::<RedisBackend>(RedisBackend::parameters(pool))
        .build();

    Ok(Arc::new(module))
}

/// Resolves the backend from a module and wraps it in a configured facade.
pub fn cache_facade<M>(module: &M, config: &RedisConfig) -> CacheFacade
where
    M: HasComponent<dyn KeyValueBackend>,
{
    let backend: Arc<dyn KeyValueBackend> = module.resolve();
    CacheFacade::from_config(backend, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ttl::Ttl;
    use strata_core::HealthCheck;

    #[tokio::test]
    async fn test_disabled_module_degrades() {
        let config = RedisConfig {
            enabled: false,
            ..RedisConfig::default()
        };

        let module = build_cache_module(&config).await.unwrap();
        let cache = cache_facade(module.as_ref(), &config);

        assert!(!cache.is_available().await);
        assert!(!cache.set("k", "v", Ttl::seconds(10)).await);
        assert_eq!(cache.get::<String>("k").await, None);
        assert_eq!(cache.strict().backend().name(), "redis");
    }
}
