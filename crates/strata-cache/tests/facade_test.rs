//! Integration tests for the lenient cache facade.

mod common;

use common::{memory_cache, refusing_cache};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use strata_cache::{
    CacheFacade, KeyValueBackend, MemoryBackend, TimeUnit, Ttl, EXPIRE_ERROR, EXPIRE_MISSING,
    EXPIRE_PERSISTENT,
};
use strata_config::RedisConfig;
use strata_core::StrataError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Vehicle {
    plate: String,
    seats: u8,
}

fn vehicle(plate: &str) -> Vehicle {
    Vehicle {
        plate: plate.to_string(),
        seats: 4,
    }
}

#[tokio::test]
async fn test_set_then_get_round_trips() {
    let (_, cache) = memory_cache();

    assert!(cache.set("vehicle:1", &vehicle("A-1"), Ttl::seconds(60)).await);

    let found: Option<Vehicle> = cache.get("vehicle:1").await;
    assert_eq!(found, Some(vehicle("A-1")));
    assert!(cache.has_key("vehicle:1").await);
}

#[tokio::test]
async fn test_get_missing_key_is_none() {
    let (_, cache) = memory_cache();
    assert_eq!(cache.get::<Vehicle>("absent").await, None);
    assert!(!cache.has_key("absent").await);
}

#[tokio::test]
async fn test_set_applies_ttl() {
    let (_, cache) = memory_cache();
    cache.set("k", "v", Ttl::seconds(60)).await;

    let remaining = cache.get_expire("k", TimeUnit::Seconds).await;
    assert!((58..=60).contains(&remaining), "remaining was {}", remaining);
}

#[tokio::test]
async fn test_entry_expires() {
    let (_, cache) = memory_cache();
    cache.set("short", &1, Ttl::millis(30)).await;

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(cache.get::<i32>("short").await, None);
    assert_eq!(cache.get_expire("short", TimeUnit::Seconds).await, EXPIRE_MISSING);
}

#[tokio::test]
async fn test_unbounded_ttl_is_stored_without_expiry() {
    let (_, cache) = memory_cache();
    let forever = Ttl::from(Duration::MAX);
    let fields: HashMap<&str, i32> = HashMap::from([("a", 1)]);

    assert!(cache.set("k", &1, forever).await);
    assert!(cache.expire("k", forever).await);
    assert!(cache.hmset("h", &fields, forever).await);
    assert_eq!(cache.s_set("s", forever, &[1, 2]).await, 2);
    assert!(cache.l_set("l", &1, forever).await);

    assert_eq!(cache.get::<i32>("k").await, Some(1));
    assert_eq!(cache.get_expire("k", TimeUnit::Seconds).await, EXPIRE_PERSISTENT);
    assert_eq!(cache.l_get_all::<i32>("l").await, Some(vec![1]));
}

#[tokio::test]
async fn test_expire_on_existing_and_missing_keys() {
    let (_, cache) = memory_cache();
    cache.set("k", &1, Ttl::seconds(5)).await;

    assert!(cache.expire("k", Ttl::minutes(10)).await);
    assert!(cache.get_expire("k", TimeUnit::Minutes).await >= 9);
    assert!(!cache.expire("absent", Ttl::seconds(5)).await);
}

#[tokio::test]
async fn test_get_expire_distinguishes_persistent_keys() {
    let (backend, cache) = memory_cache();
    backend.set("legacy", b"1".to_vec(), None).await.unwrap();

    assert_eq!(cache.get_expire("legacy", TimeUnit::Seconds).await, EXPIRE_PERSISTENT);
    assert_eq!(cache.get_expire("absent", TimeUnit::Seconds).await, EXPIRE_MISSING);
}

#[tokio::test]
async fn test_del_counts_existing_keys() {
    let (_, cache) = memory_cache();
    cache.set("a", &1, Ttl::seconds(60)).await;
    cache.set("b", &2, Ttl::seconds(60)).await;

    assert_eq!(cache.del(&["a", "b", "c"]).await, 2);
    assert!(!cache.has_key("a").await);
    assert_eq!(cache.del(&[]).await, 0);
}

#[tokio::test]
async fn test_hmset_then_hmget() {
    let (_, cache) = memory_cache();
    let fields: HashMap<&str, i32> = [("a", 1), ("b", 2)].into();

    assert!(cache.hmset("h", &fields, Ttl::seconds(60)).await);

    let stored: HashMap<String, i32> = cache.hmget("h").await.unwrap();
    assert_eq!(stored, HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]));
    assert!(cache.get_expire("h", TimeUnit::Seconds).await > 0);
}

#[tokio::test]
async fn test_hash_field_operations() {
    let (_, cache) = memory_cache();

    assert!(cache.hset("h", "owner", &vehicle("B-2"), Ttl::seconds(60)).await);
    assert!(cache.hset("h", "spare", &vehicle("C-3"), Ttl::seconds(60)).await);

    assert_eq!(cache.hget::<Vehicle>("h", "owner").await, Some(vehicle("B-2")));
    assert!(cache.h_has_key("h", "spare").await);
    assert!(!cache.h_has_key("h", "nope").await);

    assert_eq!(cache.hdel("h", &["spare", "nope"]).await, 1);
    assert!(!cache.h_has_key("h", "spare").await);
    assert_eq!(cache.hget::<Vehicle>("h", "spare").await, None);
}

#[tokio::test]
async fn test_hmget_missing_key_is_empty() {
    let (_, cache) = memory_cache();
    let stored: Option<HashMap<String, i32>> = cache.hmget("absent").await;
    assert_eq!(stored, Some(HashMap::new()));
}

#[tokio::test]
async fn test_s_set_counts_new_members() {
    let (_, cache) = memory_cache();

    assert_eq!(cache.s_set("s", Ttl::seconds(60), &["x", "y", "x"]).await, 2);
    assert_eq!(cache.s_get_set_size("s").await, 2);
    assert_eq!(cache.s_set("s", Ttl::seconds(60), &["y", "z"]).await, 1);

    let members: HashSet<String> = cache.s_get("s").await.unwrap();
    let expected: HashSet<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
    assert_eq!(members, expected);
}

#[tokio::test]
async fn test_set_membership_and_removal() {
    let (_, cache) = memory_cache();
    cache.s_set("s", Ttl::seconds(60), &[1, 2, 3]).await;

    assert!(cache.s_has_key("s", &2).await);
    assert!(!cache.s_has_key("s", &9).await);

    assert_eq!(cache.set_remove("s", &[2, 9]).await, 1);
    assert_eq!(cache.s_get_set_size("s").await, 2);
    assert!(!cache.s_has_key("s", &2).await);
}

#[tokio::test]
async fn test_list_preserves_insertion_order() {
    let (_, cache) = memory_cache();
    for item in ["a", "b", "c"] {
        assert!(cache.l_set("l", item, Ttl::seconds(60)).await);
    }

    assert_eq!(cache.l_get_all::<String>("l").await.unwrap(), vec!["a", "b", "c"]);
    assert_eq!(cache.l_get::<String>("l", 1, 2).await.unwrap(), vec!["b", "c"]);
    assert_eq!(cache.l_get::<String>("l", -2, -1).await.unwrap(), vec!["b", "c"]);
    assert_eq!(cache.l_get_list_size("l").await, 3);
    assert_eq!(cache.l_get_index::<String>("l", 0).await.as_deref(), Some("a"));
    assert_eq!(cache.l_get_index::<String>("l", -1).await.as_deref(), Some("c"));
    assert_eq!(cache.l_get_index::<String>("l", 5).await, None);
}

#[tokio::test]
async fn test_list_range_out_of_bounds_is_empty() {
    let (_, cache) = memory_cache();
    cache.l_set("l", &1, Ttl::seconds(60)).await;

    assert_eq!(cache.l_get::<i32>("l", 3, 10).await, Some(Vec::new()));
    assert_eq!(cache.l_get_all::<i32>("absent").await, Some(Vec::new()));
}

#[tokio::test]
async fn test_get_or_load_caches_on_miss() {
    let (_, cache) = memory_cache();

    let loaded = cache
        .get_or_load("vehicle:9", Ttl::seconds(60), || async { Ok(vehicle("Z-9")) })
        .await
        .unwrap();
    assert_eq!(loaded, vehicle("Z-9"));

    let cached = cache
        .get_or_load("vehicle:9", Ttl::seconds(60), || async {
            Err::<Vehicle, _>(StrataError::internal("loader must not run on a hit"))
        })
        .await
        .unwrap();
    assert_eq!(cached, vehicle("Z-9"));
}

#[tokio::test]
async fn test_get_or_load_propagates_loader_errors() {
    let (_, cache) = memory_cache();

    let result = cache
        .get_or_load("k", Ttl::seconds(60), || async {
            Err::<i32, _>(StrataError::internal("database down"))
        })
        .await;

    assert!(matches!(result, Err(StrataError::Internal(_))));
    assert!(!cache.has_key("k").await);
}

#[tokio::test]
async fn test_sweep_persistent_reconciles_orphans() {
    let (backend, cache) = memory_cache();
    backend.set("session:1", b"1".to_vec(), None).await.unwrap();
    backend.set("session:2", b"2".to_vec(), None).await.unwrap();
    cache.set("session:3", &3, Ttl::seconds(60)).await;
    backend.set("other:1", b"1".to_vec(), None).await.unwrap();

    assert_eq!(cache.sweep_persistent("session:*", Ttl::seconds(30)).await, 2);

    assert!(cache.get_expire("session:1", TimeUnit::Seconds).await > 0);
    assert_eq!(cache.get_expire("other:1", TimeUnit::Seconds).await, EXPIRE_PERSISTENT);
    assert_eq!(cache.sweep_persistent("session:*", Ttl::seconds(30)).await, 0);
}

#[tokio::test]
async fn test_configured_default_ttl() {
    let config = RedisConfig {
        default_ttl_secs: 120,
        ..RedisConfig::default()
    };
    let backend = Arc::new(MemoryBackend::new());
    let cache = CacheFacade::from_config(backend.clone(), &config);
    backend.set("orphan", b"1".to_vec(), None).await.unwrap();

    assert_eq!(cache.sweep_orphans("*").await, 1);
    let remaining = cache.get_expire("orphan", TimeUnit::Seconds).await;
    assert!((110..=120).contains(&remaining), "remaining was {}", remaining);

    let value = cache.get_or_load_default("loaded", || async { Ok(5_u8) }).await.unwrap();
    assert_eq!(value, 5);
    assert!(cache.get_expire("loaded", TimeUnit::Minutes).await >= 1);
}

#[tokio::test]
async fn test_refusing_backend_yields_neutral_values() {
    let (backend, cache) = refusing_cache();
    let ttl = Ttl::seconds(60);
    let fields: HashMap<String, i32> = [("a".to_string(), 1)].into();

    assert!(!cache.set("k", &1, ttl).await);
    assert_eq!(cache.get::<i32>("k").await, None);
    assert!(!cache.expire("k", ttl).await);
    assert_eq!(cache.get_expire("k", TimeUnit::Seconds).await, EXPIRE_ERROR);
    assert!(!cache.has_key("k").await);
    assert_eq!(cache.del(&["k"]).await, 0);

    assert!(!cache.hmset("h", &fields, ttl).await);
    assert!(!cache.hset("h", "a", &1, ttl).await);
    assert_eq!(cache.hget::<i32>("h", "a").await, None);
    assert_eq!(cache.hmget::<i32>("h").await, None);
    assert_eq!(cache.hdel("h", &["a"]).await, 0);
    assert!(!cache.h_has_key("h", "a").await);

    assert_eq!(cache.s_get::<i32>("s").await, None);
    assert!(!cache.s_has_key("s", &1).await);
    assert_eq!(cache.s_set("s", ttl, &[1]).await, 0);
    assert_eq!(cache.s_get_set_size("s").await, 0);
    assert_eq!(cache.set_remove("s", &[1]).await, 0);

    assert_eq!(cache.l_get::<i32>("l", 0, -1).await, None);
    assert_eq!(cache.l_get_all::<i32>("l").await, None);
    assert_eq!(cache.l_get_list_size("l").await, 0);
    assert_eq!(cache.l_get_index::<i32>("l", 0).await, None);
    assert!(!cache.l_set("l", &1, ttl).await);

    assert_eq!(cache.sweep_persistent("*", ttl).await, 0);
    assert!(!cache.is_available().await);

    assert_eq!(backend.calls(), 24);
}

#[tokio::test]
async fn test_get_or_load_survives_refusing_backend() {
    let (_, cache) = refusing_cache();

    let value = cache
        .get_or_load("k", Ttl::seconds(60), || async { Ok(41 + 1) })
        .await
        .unwrap();

    assert_eq!(value, 42);
}
