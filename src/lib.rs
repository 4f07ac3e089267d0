//! Cert Cache - a cancellable certificate cache over Redis
//!
//! Stores opaque certificate blobs as base64 text under namespaced keys and
//! exposes Get/Put/Delete/GetAll, each raced against a caller-supplied
//! cancellation token.

pub mod cache;
pub mod config;
pub mod error;
pub mod store;

pub use cache::{CacheClient, CacheStats, IndexPolicy};
pub use config::Config;
pub use error::{CacheError, Result, StoreError};
pub use store::{KvStore, MemoryStore, RedisStore};
pub use tokio_util::sync::CancellationToken;
