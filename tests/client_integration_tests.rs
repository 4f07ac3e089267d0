//! Integration Tests for the Cache Client
//!
//! Drives the public API end to end against the in-memory store, and against
//! a live Redis server when `CERT_CACHE_TEST_REDIS` points at one.

use std::sync::Arc;
use std::time::Duration;

use cert_cache::cache::deadline_token;
use cert_cache::store::CommandCounts;
use cert_cache::{
    CacheClient, CacheError, CancellationToken, Config, IndexPolicy, KvStore, MemoryStore,
};

// == Helper Functions ==

fn memory_client(config: &Config) -> CacheClient<MemoryStore> {
    CacheClient::with_store(MemoryStore::new(), config).unwrap()
}

/// Returns a client on the test Redis server, or None when none is configured.
async fn redis_client(namespace: &str) -> Option<CacheClient> {
    let addr = std::env::var("CERT_CACHE_TEST_REDIS").ok()?;
    let config = Config {
        redis_addr: addr,
        namespace: namespace.to_string(),
        ..Config::default()
    };
    Some(CacheClient::connect(&config).await.unwrap())
}

// == Cache Contract ==

#[tokio::test]
async fn test_certificate_lifecycle() {
    let client = memory_client(&Config::default());
    let token = CancellationToken::new();
    let cert = b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n".to_vec();
    let key = vec![0u8, 1, 2, 254, 255];

    assert!(client.get(&token, "example.com").await.unwrap_err().is_miss());

    client.put(&token, "example.com", &cert).await.unwrap();
    client.put(&token, "example.com+rsa", &key).await.unwrap();

    assert_eq!(client.get(&token, "example.com").await.unwrap(), cert);
    assert_eq!(client.get_all(&token).await.unwrap(), vec![cert.clone(), key]);

    client.delete(&token, "example.com+rsa").await.unwrap();
    assert!(client.get(&token, "example.com+rsa").await.unwrap_err().is_miss());

    let stats = client.stats().await;
    assert_eq!(stats.writes, 2);
    assert_eq!(stats.deletes, 1);
    assert_eq!(stats.misses, 2);
}

#[tokio::test]
async fn test_overwrite_replaces_record() {
    let client = memory_client(&Config::default());
    let token = CancellationToken::new();

    client.put(&token, "example.com", b"first").await.unwrap();
    client.put(&token, "example.com", b"second").await.unwrap();

    assert_eq!(client.get(&token, "example.com").await.unwrap(), b"second");
    assert_eq!(client.known_names().await, vec!["example.com", "example.com"]);
}

#[tokio::test]
async fn test_namespaces_do_not_collide() {
    let store = Arc::new(MemoryStore::new());
    let token = CancellationToken::new();

    let config = Config {
        namespace: "tenant-a".to_string(),
        ..Config::default()
    };
    let client = CacheClient::with_store(SharedStore(Arc::clone(&store)), &config).unwrap();
    client.put(&token, "example.com", b"a").await.unwrap();

    assert_eq!(store.raw("tenant-a/example.com").await.as_deref(), Some("YQ=="));
    assert_eq!(store.raw("certcache/example.com").await, None);
}

#[tokio::test]
async fn test_pre_cancelled_put_sends_nothing() {
    let client = memory_client(&Config::default());
    let token = CancellationToken::new();
    token.cancel();

    let err = client.put(&token, "example.com", b"data").await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(client.store().counts(), CommandCounts::default());
    assert!(client.store().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_cancels_slow_read() {
    let store = MemoryStore::with_latency(Duration::from_secs(30));
    let client = CacheClient::with_store(store, &Config::default()).unwrap();
    let token = deadline_token(&CancellationToken::new(), Duration::from_millis(100));

    let err = client.get(&token, "example.com").await.unwrap_err();

    assert!(matches!(err, CacheError::Cancelled));
    assert_eq!(client.store().counts().gets, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pre_cancelled_delete_is_still_dispatched() {
    let client = memory_client(&Config::default());
    let token = CancellationToken::new();
    client.put(&token, "example.com", b"data").await.unwrap();

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let err = client.delete(&cancelled, "example.com").await.unwrap_err();
    assert!(err.is_cancelled());

    // The abandoned delete still runs to completion
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.store().counts().deletes, 1);
    assert!(client.get(&token, "example.com").await.unwrap_err().is_miss());
}

#[tokio::test]
async fn test_get_all_fails_wholesale() {
    let client = memory_client(&Config::default());
    let token = CancellationToken::new();

    client.put(&token, "a", b"X").await.unwrap();
    client.put(&token, "b", b"Y").await.unwrap();
    client.put(&token, "c", b"Z").await.unwrap();
    client.store().remove_raw("certcache/b").await;

    let err = client.get_all(&token).await.unwrap_err();
    assert!(err.is_miss());
    assert_eq!(err.to_string(), "failed to load record b");
}

#[tokio::test]
async fn test_get_all_after_pruning_delete() {
    let config = Config {
        index_policy: IndexPolicy::PruneOnDelete,
        ..Config::default()
    };
    let client = memory_client(&config);
    let token = CancellationToken::new();

    client.put(&token, "a", b"X").await.unwrap();
    client.put(&token, "b", b"Y").await.unwrap();
    client.delete(&token, "a").await.unwrap();

    assert_eq!(client.get_all(&token).await.unwrap(), vec![b"Y".to_vec()]);
}

#[tokio::test]
async fn test_store_outage_surfaces_and_recovers() {
    let client = memory_client(&Config::default());
    let token = CancellationToken::new();

    client.store().fail_with("connection refused");
    let err = client.put(&token, "example.com", b"data").await.unwrap_err();
    assert_eq!(err.to_string(), "SET failed for key certcache/example.com");

    client.store().recover();
    client.put(&token, "example.com", b"data").await.unwrap();
    assert_eq!(client.get(&token, "example.com").await.unwrap(), b"data");
    assert_eq!(client.stats().await.failures, 1);
}

// == Redis ==

#[tokio::test]
async fn test_redis_roundtrip_and_miss() {
    let Some(client) = redis_client("cert-cache-test-roundtrip").await else {
        return;
    };
    let token = CancellationToken::new();

    client.delete(&token, "example.com").await.unwrap();
    assert!(client.get(&token, "example.com").await.unwrap_err().is_miss());

    client.put(&token, "example.com", &[0, 159, 146, 150]).await.unwrap();
    assert_eq!(
        client.get(&token, "example.com").await.unwrap(),
        vec![0, 159, 146, 150]
    );

    client.delete(&token, "example.com").await.unwrap();
    client.delete(&token, "example.com").await.unwrap();
    assert!(client.get(&token, "example.com").await.unwrap_err().is_miss());
}

#[tokio::test]
async fn test_redis_get_all_order() {
    let Some(client) = redis_client("cert-cache-test-order").await else {
        return;
    };
    let token = CancellationToken::new();

    client.put(&token, "a", b"X").await.unwrap();
    client.put(&token, "b", b"Y").await.unwrap();

    assert_eq!(
        client.get_all(&token).await.unwrap(),
        vec![b"X".to_vec(), b"Y".to_vec()]
    );

    client.delete(&token, "a").await.unwrap();
    client.delete(&token, "b").await.unwrap();
}

// == Test Store ==

/// Lets a test keep a handle on a store owned by the client.
struct SharedStore(Arc<MemoryStore>);

#[async_trait::async_trait]
impl KvStore for SharedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, cert_cache::StoreError> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), cert_cache::StoreError> {
        self.0.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), cert_cache::StoreError> {
        self.0.delete(key).await
    }
}
