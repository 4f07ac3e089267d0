//! Memory Store
//!
//! HashMap-backed store used by tests and local runs. Counts every command it
//! receives and can be told to fail or to answer slowly, which makes the
//! client's cancellation and error paths observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KvStore;
use crate::error::StoreError;

// == Command Counts ==
/// Number of commands that reached the store, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCounts {
    pub gets: u64,
    pub sets: u64,
    pub deletes: u64,
}

// == Memory Store ==
/// In-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: RwLock<HashMap<String, String>>,
    gets: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    /// Delay applied to every command before it touches the map
    latency: Duration,
    /// When set, every command fails with this message
    failure: Mutex<Option<String>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store answering immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that sleeps `latency` before each command.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    // == Fault Injection ==
    /// Makes every following command fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.lock_failure() = Some(message.to_string());
    }

    /// Stops failing commands.
    pub fn recover(&self) {
        *self.lock_failure() = None;
    }

    // == Direct Access ==
    /// Writes raw text, bypassing the command counters.
    pub async fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Removes a key, bypassing the command counters.
    pub async fn remove_raw(&self, key: &str) -> Option<String> {
        self.entries.write().await.remove(key)
    }

    /// Reads raw text, bypassing the command counters.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Returns the number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Counters ==
    /// Returns how many commands of each kind were received.
    pub fn counts(&self) -> CommandCounts {
        CommandCounts {
            gets: self.gets.load(Ordering::SeqCst),
            sets: self.sets.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    async fn begin(&self, counter: &AtomicU64) -> Result<(), StoreError> {
        counter.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.lock_failure().as_ref() {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn lock_failure(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds a usable Option
        self.failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.begin(&self.gets).await?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.begin(&self.sets).await?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.begin(&self.deletes).await?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}
