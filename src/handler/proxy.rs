//! Caching origin proxy
//!
//! Forwards tile requests to the build server, consulting the response cache
//! first. Only successful origin responses are stored.

use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::error::{Result, TileError};
use crate::handler::is_valid_resource_name;
use crate::http::{self, TileResponse};
use crate::logger;
use crate::origin::{LatestResolver, OriginClient, LATEST_ALIAS};
use bytes::Bytes;
use std::sync::Arc;

pub struct ProxyForwarder {
    cache: Arc<dyn CacheStore>,
    origin: OriginClient,
    latest: LatestResolver,
}

impl ProxyForwarder {
    pub fn new(cache: Arc<dyn CacheStore>, origin: OriginClient, latest: LatestResolver) -> Self {
        Self {
            cache,
            origin,
            latest,
        }
    }

    pub fn origin_base_url(&self) -> &str {
        self.origin.base_url()
    }

    pub const fn origin_insecure_tls(&self) -> bool {
        self.origin.insecure_tls()
    }

    pub fn cache_location(&self) -> String {
        self.cache.describe()
    }

    /// Serve `name` from the cache or the origin, forwarding `range` verbatim
    pub async fn forward(&self, name: &str, range: Option<&str>) -> TileResponse {
        self.try_forward(name, range)
            .await
            .unwrap_or_else(TileError::into_response)
    }

    async fn try_forward(&self, name: &str, range: Option<&str>) -> Result<TileResponse> {
        let resource = self.resolve_name(name).await?;
        let key = CacheKey::new(&resource, range);

        if let Some(entry) = self.lookup(&key, &resource, range).await {
            return Ok(http::build_relay_response(entry.status, &entry.headers, entry.body));
        }

        let entry = self.origin.fetch(&resource, range).await?;

        if let Err(e) = self.cache.put(&key, &entry).await {
            logger::log_error(&format!("Cache write failed for {resource}: {e}"));
        }

        Ok(http::build_relay_response(entry.status, &entry.headers, entry.body))
    }

    /// Headers-only counterpart of [`forward`](Self::forward)
    ///
    /// A cached entry answers with its status and headers; a miss becomes an
    /// origin HEAD whose result is relayed but never cached.
    pub async fn head(&self, name: &str, range: Option<&str>) -> TileResponse {
        self.try_head(name, range)
            .await
            .unwrap_or_else(TileError::into_response)
    }

    async fn try_head(&self, name: &str, range: Option<&str>) -> Result<TileResponse> {
        let resource = self.resolve_name(name).await?;
        let key = CacheKey::new(&resource, range);

        let entry = match self.lookup(&key, &resource, range).await {
            Some(entry) => entry,
            None => self.origin.head(&resource, range).await?,
        };
        Ok(http::build_relay_response(entry.status, &entry.headers, Bytes::new()))
    }

    /// Cache lookup where a read failure counts as a miss
    async fn lookup(&self, key: &CacheKey, resource: &str, range: Option<&str>) -> Option<CacheEntry> {
        match self.cache.get(key).await {
            Ok(Some(entry)) => {
                logger::log_debug(&format!("Cache hit: {resource} {range:?}"));
                Some(entry)
            }
            Ok(None) => {
                logger::log_debug(&format!("Cache miss: {resource} {range:?}"));
                None
            }
            Err(e) => {
                logger::log_warning(&format!("Cache read failed for {resource}: {e}"));
                None
            }
        }
    }

    /// Turn the requested name into a concrete origin resource
    async fn resolve_name(&self, name: &str) -> Result<String> {
        if name == LATEST_ALIAS {
            return self.latest.resolve().await.ok_or(TileError::ResolutionFailed);
        }
        if !is_valid_resource_name(name) {
            logger::log_warning(&format!("Rejected tile name: {name:?}"));
            return Err(TileError::NotFound(name.to_string()));
        }
        Ok(name.to_string())
    }
}
