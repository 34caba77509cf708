// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub tiles: TilesConfig,
    #[serde(rename = "static")]
    pub static_files: StaticConfig,
    pub origin: OriginConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Local tile archive configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TilesConfig {
    /// Directory holding local archives
    pub data_dir: String,
    /// File inside `data_dir` served for `latest.pmtiles` (usually a symlink)
    pub latest_alias: String,
    /// Proxy even when a local archive is present
    pub force_proxy: bool,
}

impl TilesConfig {
    pub fn latest_alias_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.latest_alias)
    }
}

/// Static fallback configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StaticConfig {
    pub root: String,
    pub index_files: Vec<String>,
}

/// Upstream build server configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct OriginConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Skip certificate and hostname verification toward the origin
    pub insecure_tls: bool,
    pub timeout_secs: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "https://build.protomaps.com".to_string(),
            user_agent: "Mozilla/5.0 (pmtiles-proxy)".to_string(),
            insecure_tls: true,
            timeout_secs: 120,
        }
    }
}

/// Proxy response cache configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    pub dir: String,
}

/// HTTP behavior configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub enable_cors: bool,
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds allowed for a request head to arrive, idle keep-alive
    /// waits included; 0 disables the bound
    pub connection_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
    /// Emit per-probe and per-cache-lookup debug lines
    pub debug: bool,
}
