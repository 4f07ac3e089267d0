//! Cache Client Module
//!
//! Cancellable Get/Put/Delete/GetAll over a `KvStore`.
//!
//! Every operation runs its store command on a detached Tokio task and races
//! that task against the caller's `CancellationToken`. When the token wins,
//! the task is abandoned rather than aborted: the command keeps running and a
//! write may still land after the caller has seen `CacheError::Cancelled`.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::cache::codec::{self, storage_key};
use crate::cache::{CacheStats, IndexPolicy, NameIndex};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::{KvStore, RedisStore};

// == Cache Client ==
/// Certificate cache backed by a key-value store.
///
/// Names written through `put` are remembered in a process-local
/// [`NameIndex`] so `get_all` can enumerate them. Records written by other
/// processes, or before a restart, are invisible to `get_all`.
pub struct CacheClient<S: KvStore = RedisStore> {
    /// Backing store endpoint
    address: String,
    /// Prefix of every storage key
    namespace: String,
    /// Shared store handle, also held by in-flight tasks
    store: Arc<S>,
    /// Names in the order their writes were dispatched
    index: Arc<RwLock<NameIndex>>,
    /// What a successful delete does to the index
    policy: IndexPolicy,
    /// Activity counters
    stats: Arc<RwLock<CacheStats>>,
}

impl CacheClient<RedisStore> {
    // == Connect ==
    /// Dials Redis at `config.redis_addr` and builds a client on that connection.
    pub async fn connect(config: &Config) -> Result<Self> {
        let store = RedisStore::connect(&config.redis_url())
            .await
            .map_err(|source| CacheError::Connect {
                addr: config.redis_addr.clone(),
                source,
            })?;

        Self::with_store(store, config)
    }
}

impl<S: KvStore> CacheClient<S> {
    // == Constructor ==
    /// Builds a client over an already connected store.
    ///
    /// Rejects an empty namespace, which would let keys collide with
    /// unrelated data.
    pub fn with_store(store: S, config: &Config) -> Result<Self> {
        if config.namespace.is_empty() {
            return Err(CacheError::Config("namespace must not be empty".to_string()));
        }

        Ok(Self {
            address: config.redis_addr.clone(),
            namespace: config.namespace.clone(),
            store: Arc::new(store),
            index: Arc::new(RwLock::new(NameIndex::new())),
            policy: config.index_policy,
            stats: Arc::new(RwLock::new(CacheStats::new())),
        })
    }

    // == Get ==
    /// Reads and decodes the record stored under `name`.
    ///
    /// Returns `CacheError::Miss` when the store has no value for the key.
    #[instrument(level = "debug", skip(self, token), fields(namespace = %self.namespace))]
    pub async fn get(&self, token: &CancellationToken, name: &str) -> Result<Vec<u8>> {
        let key = storage_key(&self.namespace, name);
        let store = Arc::clone(&self.store);
        let task_key = key.clone();
        let task = tokio::spawn(async move { store.get(&task_key).await });

        let raced = self.race(token, &key, task).await;
        let outcome = match raced {
            Ok(Ok(Some(text))) => codec::decode(&key, &text),
            Ok(Ok(None)) => Err(CacheError::Miss),
            Ok(Err(source)) => Err(CacheError::Store {
                op: "GET",
                key,
                source,
            }),
            Err(err) => Err(err),
        };

        let mut stats = self.stats.write().await;
        match &outcome {
            Ok(_) => stats.record_hit(),
            Err(CacheError::Miss) => stats.record_miss(),
            Err(CacheError::Cancelled) => stats.record_cancellation(),
            Err(_) => stats.record_failure(),
        }

        outcome
    }

    // == Put ==
    /// Encodes `data` and writes it under `name`.
    ///
    /// A token that is already cancelled stops the write before it reaches
    /// the store. Once dispatched, the write is never stopped, and the name is
    /// recorded in the index whether or not the store accepts it.
    #[instrument(level = "debug", skip(self, token, data), fields(namespace = %self.namespace, len = data.len()))]
    pub async fn put(&self, token: &CancellationToken, name: &str, data: &[u8]) -> Result<()> {
        if token.is_cancelled() {
            debug!("token already cancelled, skipping write");
            let mut stats = self.stats.write().await;
            stats.record_skipped_write();
            stats.record_cancellation();
            return Err(CacheError::Cancelled);
        }

        let key = storage_key(&self.namespace, name);
        let encoded = codec::encode(data);

        let store = Arc::clone(&self.store);
        let index = Arc::clone(&self.index);
        let stats = Arc::clone(&self.stats);
        let gate = token.clone();
        let task_key = key.clone();
        let task_name = name.to_string();

        let task = tokio::spawn(async move {
            // Checked again here: the token may fire before the task is polled
            if gate.is_cancelled() {
                stats.write().await.record_skipped_write();
                return None;
            }

            index.write().await.record(&task_name);
            stats.write().await.record_write();
            Some(store.set(&task_key, &encoded).await)
        });

        let raced = self.race(token, &key, task).await;
        let outcome = match raced {
            Ok(Some(Ok(()))) => Ok(()),
            Ok(Some(Err(source))) => Err(CacheError::Store {
                op: "SET",
                key,
                source,
            }),
            Ok(None) => Err(CacheError::Cancelled),
            Err(err) => Err(err),
        };

        self.record_outcome(&outcome).await;
        outcome
    }

    // == Delete ==
    /// Deletes the record stored under `name`.
    ///
    /// Deleting an absent record succeeds. Under `IndexPolicy::AppendOnly`
    /// the name stays in the index, so a later `get_all` fails on it.
    #[instrument(level = "debug", skip(self, token), fields(namespace = %self.namespace))]
    pub async fn delete(&self, token: &CancellationToken, name: &str) -> Result<()> {
        let key = storage_key(&self.namespace, name);
        let store = Arc::clone(&self.store);
        let task_key = key.clone();
        let task = tokio::spawn(async move { store.delete(&task_key).await });

        let raced = self.race(token, &key, task).await;
        let outcome = match raced {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(CacheError::Store {
                op: "DEL",
                key,
                source,
            }),
            Err(err) => Err(err),
        };

        if outcome.is_ok() {
            self.stats.write().await.record_delete();
            if self.policy == IndexPolicy::PruneOnDelete {
                let dropped = self.index.write().await.forget(name);
                debug!(dropped, "pruned name from index");
            }
        } else {
            self.record_outcome(&outcome).await;
        }

        outcome
    }

    // == Get All ==
    /// Reads every record named in the index, in write order.
    ///
    /// Fails as a whole on the first record that cannot be read, including a
    /// miss; no partial list is returned. Cancellation is reported as
    /// `CacheError::Cancelled` rather than being wrapped.
    #[instrument(level = "debug", skip(self, token), fields(namespace = %self.namespace))]
    pub async fn get_all(&self, token: &CancellationToken) -> Result<Vec<Vec<u8>>> {
        if token.is_cancelled() {
            self.stats.write().await.record_cancellation();
            return Err(CacheError::Cancelled);
        }

        let names = self.index.read().await.snapshot();
        let mut records = Vec::with_capacity(names.len());

        for name in names {
            match self.get(token, &name).await {
                Ok(data) => records.push(data),
                Err(CacheError::Cancelled) => return Err(CacheError::Cancelled),
                Err(source) => {
                    warn!(record = %name, error = %source, "enumeration aborted");
                    return Err(CacheError::Record {
                        name,
                        source: Box::new(source),
                    });
                }
            }
        }

        debug!(count = records.len(), "enumerated records");
        Ok(records)
    }

    // == Accessors ==
    /// Returns the backing store endpoint.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the storage key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the index policy in effect.
    pub fn index_policy(&self) -> IndexPolicy {
        self.policy
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the names currently in the index, in write order.
    pub async fn known_names(&self) -> Vec<String> {
        self.index.read().await.snapshot()
    }

    /// Returns a snapshot of the activity counters.
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    // == Race ==
    /// Waits for `task` or for `token`, whichever finishes first.
    ///
    /// Cancellation is polled first so an already fired token always wins.
    /// Dropping the JoinHandle detaches the task; it is not aborted.
    async fn race<T>(
        &self,
        token: &CancellationToken,
        key: &str,
        task: JoinHandle<T>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(key, "cancelled, abandoning in-flight store command");
                Err(CacheError::Cancelled)
            }
            joined = task => joined.map_err(|source| CacheError::Task {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn record_outcome(&self, outcome: &Result<()>) {
        let mut stats = self.stats.write().await;
        match outcome {
            Ok(()) => {}
            Err(CacheError::Cancelled) => stats.record_cancellation(),
            Err(_) => stats.record_failure(),
        }
    }
}

impl<S: KvStore> std::fmt::Debug for CacheClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
