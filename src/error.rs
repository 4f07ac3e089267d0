//! Error types for the certificate cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error ==
/// Failure reported by a backing store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport or protocol failure from Redis
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    /// The store could not serve the command
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// == Cache Error Enum ==
/// Unified error type for cache client operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No record stored under the name. Safe to regenerate.
    #[error("cache miss")]
    Miss,

    /// The caller's cancellation token fired first
    #[error("operation cancelled")]
    Cancelled,

    /// The backing store failed a command
    #[error("{op} failed for key {key}")]
    Store {
        op: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },

    /// Stored text is not valid base64
    #[error("failed to decode record at key {key}")]
    Decode {
        key: String,
        #[source]
        source: base64::DecodeError,
    },

    /// A record could not be read while enumerating the index
    #[error("failed to load record {name}")]
    Record {
        name: String,
        #[source]
        source: Box<CacheError>,
    },

    /// The background task running a store command panicked or was aborted
    #[error("store task for key {key} did not complete")]
    Task {
        key: String,
        #[source]
        source: tokio::task::JoinError,
    },

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The initial connection to the store could not be established
    #[error("failed to connect to {addr}")]
    Connect {
        addr: String,
        #[source]
        source: StoreError,
    },
}

impl CacheError {
    /// Returns true for a miss, including a miss surfaced while enumerating.
    pub fn is_miss(&self) -> bool {
        match self {
            CacheError::Miss => true,
            CacheError::Record { source, .. } => source.is_miss(),
            _ => false,
        }
    }

    /// Returns true when the caller's cancellation token won the race.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CacheError::Cancelled)
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
