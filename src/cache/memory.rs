//! In-process cache store
//!
//! Same contract as [`super::DiskCache`] without persistence; useful when
//! embedding the proxy or in tests.

use super::{CacheEntry, CacheKey, CacheStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        self.entries.write().await.insert(key.clone(), entry.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_roundtrip_and_absence() {
        let cache = MemoryCache::new();
        let key = CacheKey::new("a.pmtiles", Some("bytes=0-1"));
        let entry = CacheEntry {
            status: 206,
            headers: vec![("Content-Range".to_string(), "bytes 0-1/2".to_string())],
            body: Bytes::from_static(b"ab"),
        };

        assert_eq!(cache.get(&key).await.unwrap(), None);
        cache.put(&key, &entry).await.unwrap();
        cache.put(&key, &entry).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(entry));
        assert_eq!(cache.len().await, 1);
        assert_eq!(
            cache.get(&CacheKey::new("a.pmtiles", None)).await.unwrap(),
            None
        );
    }
}
