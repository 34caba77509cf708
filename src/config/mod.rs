// Configuration module entry point
// Loads configuration from defaults, an optional TOML file, environment
// variables and command-line overrides, and owns the shared application state

mod cli;
mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use cli::CliArgs;
pub use state::AppState;
pub use types::{
    CacheConfig, Config, HttpConfig, LoggingConfig, OriginConfig, PerformanceConfig,
    ServerConfig, StaticConfig, TilesConfig,
};

/// Environment variable prefix, e.g. `PMTILES_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "PMTILES";

/// Config file used when `--config` is not given (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "config";

type Builder = ::config::ConfigBuilder<::config::builder::DefaultState>;

impl Config {
    /// Load configuration: defaults < config file < environment < CLI
    pub fn load(args: &CliArgs) -> Result<Self, ::config::ConfigError> {
        let config_path = args.config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let mut builder = Self::with_defaults()?
            .add_source(::config::File::with_name(config_path).required(args.config_path.is_some()))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(port) = args.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if args.proxy {
            builder = builder.set_override("tiles.force_proxy", true)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Built-in defaults only, ignoring files and environment
    pub fn defaults() -> Result<Self, ::config::ConfigError> {
        Self::with_defaults()?.build()?.try_deserialize()
    }

    fn with_defaults() -> Result<Builder, ::config::ConfigError> {
        let origin = OriginConfig::default();
        ::config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("tiles.data_dir", "data")?
            .set_default("tiles.latest_alias", "planet-latest.pmtiles")?
            .set_default("tiles.force_proxy", false)?
            .set_default("static.root", ".")?
            .set_default("static.index_files", vec!["index.html"])?
            .set_default("origin.base_url", origin.base_url)?
            .set_default("origin.user_agent", origin.user_agent)?
            .set_default("origin.insecure_tls", origin.insecure_tls)?
            .set_default("origin.timeout_secs", origin.timeout_secs)?
            .set_default("cache.dir", ".cache")?
            .set_default("http.enable_cors", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 300)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("logging.debug", false)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::defaults().unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.tiles.data_dir, "data");
        assert!(!cfg.tiles.force_proxy);
        assert_eq!(
            cfg.tiles.latest_alias_path(),
            std::path::Path::new("data").join("planet-latest.pmtiles")
        );
        assert_eq!(cfg.static_files.index_files, vec!["index.html".to_string()]);
        assert_eq!(cfg.origin, OriginConfig::default());
        assert_eq!(cfg.cache.dir, ".cache");
        assert!(cfg.http.enable_cors);
        assert_eq!(cfg.logging.access_log_format, "combined");
    }

    #[test]
    fn test_file_and_cli_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[origin]\nbase_url = \"https://mirror.example.com\"\n\n[cache]\ndir = \"/var/cache/tiles\"\n\n[server]\nport = 9000"
        )
        .unwrap();

        let args = CliArgs {
            config_path: Some(file.path().to_string_lossy().into_owned()),
            port: Some(9100),
            proxy: true,
        };
        let cfg = Config::load(&args).unwrap();

        assert_eq!(cfg.origin.base_url, "https://mirror.example.com");
        assert_eq!(cfg.cache.dir, "/var/cache/tiles");
        assert_eq!(cfg.server.port, 9100);
        assert!(cfg.tiles.force_proxy);
        assert!(cfg.origin.insecure_tls);
    }

    #[test]
    fn test_explicit_missing_config_file_is_error() {
        let args = CliArgs {
            config_path: Some("/nonexistent/pmtiles-edge.toml".to_string()),
            ..CliArgs::default()
        };
        assert!(Config::load(&args).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::defaults().unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8080);
    }
}
