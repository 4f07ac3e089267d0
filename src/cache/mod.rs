//! Cache Module
//!
//! Cancellable certificate cache client with key namespacing, base64 payload
//! encoding and a process-local index of written names.

mod cancel;
mod client;
mod codec;
mod index;
mod stats;


// Re-export public types
pub use cancel::deadline_token;
pub use client::CacheClient;
pub use codec::{decode, encode, storage_key};
pub use index::{IndexPolicy, NameIndex};
pub use stats::CacheStats;
