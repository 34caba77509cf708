// Command-line overrides
// Only the handful of switches the dev workflow needs; everything else comes
// from the config file or the environment

use clap::Parser;

/// Serves local PMTiles archives, or proxies and caches them from the build server
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "pmtiles-edge")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Config file (default: config.toml if present)
    #[arg(short, long = "config", value_name = "PATH")]
    pub config_path: Option<String>,

    /// Port to listen on (default: 8080)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Proxy tiles from upstream instead of serving local files
    #[arg(long)]
    pub proxy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("pmtiles-edge").chain(args.iter().copied()))
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_port_and_proxy() {
        let args = parse(&["-p", "9000", "--proxy"]).unwrap();
        assert_eq!(args.port, Some(9000));
        assert!(args.proxy);

        let args = parse(&["--port=9001", "--config", "dev.toml"]).unwrap();
        assert_eq!(args.port, Some(9001));
        assert_eq!(args.config_path.as_deref(), Some("dev.toml"));

        let args = parse(&["-c", "prod.toml"]).unwrap();
        assert_eq!(args.config_path.as_deref(), Some("prod.toml"));
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["--port"]).is_err());
        assert!(parse(&["--port", "http"]).is_err());
        assert!(parse(&["--port", "70000"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn test_definition() {
        CliArgs::command().debug_assert();
    }
}
