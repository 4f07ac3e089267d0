//! Configuration Module
//!
//! Handles loading the cache client configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::IndexPolicy;

/// Default namespace prefixed to every storage key.
pub const DEFAULT_NAMESPACE: &str = "certcache";

/// Cache client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis endpoint as `host:port` or a full `redis://` URL
    pub redis_addr: String,
    /// Key prefix isolating this client's records
    pub namespace: String,
    /// Whether a successful delete also drops the name from the index
    pub index_policy: IndexPolicy,
    /// Deadline applied by the command line tool to each operation, in milliseconds
    pub op_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CERT_CACHE_REDIS_ADDR` - Redis endpoint (default: 127.0.0.1:6379)
    /// - `CERT_CACHE_NAMESPACE` - Key namespace (default: certcache)
    /// - `CERT_CACHE_PRUNE_ON_DELETE` - Prune the index on delete (default: false)
    /// - `CERT_CACHE_OP_TIMEOUT_MS` - Per-operation deadline for the CLI (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            redis_addr: env::var("CERT_CACHE_REDIS_ADDR").unwrap_or(defaults.redis_addr),
            namespace: env::var("CERT_CACHE_NAMESPACE").unwrap_or(defaults.namespace),
            index_policy: env::var("CERT_CACHE_PRUNE_ON_DELETE")
                .ok()
                .and_then(|v| parse_flag(&v))
                .map(|prune| {
                    if prune {
                        IndexPolicy::PruneOnDelete
                    } else {
                        IndexPolicy::AppendOnly
                    }
                })
                .unwrap_or(defaults.index_policy),
            op_timeout_ms: env::var("CERT_CACHE_OP_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.op_timeout_ms),
        }
    }

    /// Returns the connection URL understood by the Redis client.
    pub fn redis_url(&self) -> String {
        if self.redis_addr.contains("://") {
            self.redis_addr.clone()
        } else {
            format!("redis://{}", self.redis_addr)
        }
    }

    /// Per-operation deadline used by the command line tool.
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_addr: "127.0.0.1:6379".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            index_policy: IndexPolicy::AppendOnly,
            op_timeout_ms: 5000,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
