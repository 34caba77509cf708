//! Response cache for proxied tile requests
//!
//! Entries are addressed by (resource identifier, raw `Range` header text).
//! The store never expires or evicts anything; callers that need eviction
//! wrap a [`CacheStore`].

mod disk;
mod memory;

pub use disk::DiskCache;
pub use memory::MemoryCache;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};

/// Deterministic key for one (resource, range) pair
///
/// Two requests map to the same key only when the resource identifier and the
/// raw range text (including its absence) are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: String,
    digest: String,
}

impl CacheKey {
    pub fn new(resource: &str, range: Option<&str>) -> Self {
        // "range:" prefix keeps a literal "full" header distinct from no header
        let material = match range {
            Some(r) => format!("{resource}\nrange:{r}"),
            None => format!("{resource}\nfull"),
        };
        let mut hasher = Sha256::new();
        hasher.update(material.as_bytes());
        Self {
            resource: resource.to_string(),
            digest: format!("{:x}", hasher.finalize()),
        }
    }

    /// Hex SHA-256 of the key material
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Directory name grouping all entries of one resource
    ///
    /// Filesystem layout only; not part of the key's identity.
    pub fn partition(&self) -> String {
        let stem = self
            .resource
            .strip_suffix(".pmtiles")
            .unwrap_or(&self.resource);
        let cleaned: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
            "_".to_string()
        } else {
            cleaned
        }
    }
}

/// A stored origin response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub status: u16,
    /// Retained origin headers, in relay order
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Key to entry store consulted by the proxy before any network call
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Pure lookup; a missing entry is `Ok(None)`
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Store an entry, overwriting any previous one for the key
    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()>;

    /// Human-readable location for the startup banner
    fn describe(&self) -> String;
}
