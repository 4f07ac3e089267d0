//! Redis Store
//!
//! One async Redis connection shared by every client operation. Commands hold
//! the connection lock for their whole round-trip, so replies can never be
//! interleaved between concurrent callers.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::KvStore;
use crate::error::StoreError;

// == Redis Store ==
/// Backing store speaking to a Redis server.
pub struct RedisStore {
    /// Endpoint the connection was dialed from
    url: String,
    /// The single connection, serialized across commands
    conn: Mutex<redis::aio::Connection>,
}

impl RedisStore {
    // == Connect ==
    /// Dials the Redis server at `url` (`redis://host:port[/db]`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_async_connection().await?;
        info!("Connected to Redis at {}", url);

        Ok(Self {
            url: url.to_string(),
            conn: Mutex::new(conn),
        })
    }

    /// Returns the URL this store was connected with.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").field("url", &self.url).finish()
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.lock().await;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        debug!(key, found = value.is_some(), "GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().await;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut *conn)
            .await?;
        debug!(key, len = value.len(), "SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().await;
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut *conn).await?;
        debug!(key, removed, "DEL");
        Ok(())
    }
}
