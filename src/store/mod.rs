//! Store Module
//!
//! The command interface the cache client drives, plus its implementations.
//!
//! # Implementations
//! - `RedisStore`: a single Redis connection serialized behind an async mutex
//! - `MemoryStore`: an in-process map with command counters and fault injection

mod memory;
mod redis;

use async_trait::async_trait;

use crate::error::StoreError;

pub use self::memory::{CommandCounts, MemoryStore};
pub use self::redis::RedisStore;

// == KvStore Trait ==
/// Minimal `GET`/`SET`/`DEL` command interface of a key-value store.
///
/// `get` must return `Ok(None)` for an absent key, keeping it distinct from an
/// empty value and from a transport failure.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Reads the text stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
