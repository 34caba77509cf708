// Application state module
// The process-wide state injected into every request handler

use std::path::Path;
use std::sync::Arc;

use super::types::Config;
use crate::cache::{CacheStore, DiskCache};
use crate::error::Result;
use crate::handler::local::LocalRangeServer;
use crate::handler::proxy::ProxyForwarder;
use crate::handler::static_files::StaticFiles;
use crate::handler::TileMode;
use crate::origin::{LatestResolver, OriginClient};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Decided once at startup
    pub mode: TileMode,
    pub local: LocalRangeServer,
    pub proxy: ProxyForwarder,
    pub static_files: StaticFiles,
}

impl AppState {
    /// Build the production state: disk cache, origin client, mode selection
    pub async fn new(config: Config) -> Result<Self> {
        let cache = DiskCache::open(&config.cache.dir).await?;
        let origin = OriginClient::new(&config.origin)?;
        let latest = LatestResolver::new(Arc::new(origin.clone()));
        let mode = TileMode::select(
            config.tiles.force_proxy,
            local_alias_present(&config.tiles.latest_alias_path()),
        );

        Ok(Self::from_parts(config, mode, Arc::new(cache), origin, latest))
    }

    /// Assemble state from explicit collaborators
    pub fn from_parts(
        config: Config,
        mode: TileMode,
        cache: Arc<dyn CacheStore>,
        origin: OriginClient,
        latest: LatestResolver,
    ) -> Self {
        let local = LocalRangeServer::new(
            &config.tiles.data_dir,
            config.tiles.latest_alias_path(),
        );
        let static_files = StaticFiles::new(
            &config.static_files.root,
            config.static_files.index_files.clone(),
        );
        let proxy = ProxyForwarder::new(cache, origin, latest);

        Self {
            config,
            mode,
            local,
            proxy,
            static_files,
        }
    }
}

/// The alias counts as present even when it is a dangling symlink
fn local_alias_present(path: &Path) -> bool {
    path.is_file() || path.is_symlink()
}
