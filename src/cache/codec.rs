//! Key Codec Module
//!
//! Maps logical names to namespaced storage keys and converts payloads to and
//! from the base64 text written to the store.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{CacheError, Result};

// == Storage Key ==
/// Builds the storage key `<namespace>/<name>` for a logical name.
pub fn storage_key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

// == Encode ==
/// Encodes raw bytes as standard padded base64.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

// == Decode ==
/// Decodes stored text back to raw bytes.
///
/// `key` is only used to label the error.
pub fn decode(key: &str, text: &str) -> Result<Vec<u8>> {
    STANDARD.decode(text).map_err(|source| CacheError::Decode {
        key: key.to_string(),
        source,
    })
}
