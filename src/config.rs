// ⚙️ Configuration - command-line flags with environment fallbacks

use clap::Args;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "corp_registry=info,corp_registry_server=info,tower_http=info";

/// Where the data lives (shared by the server and the CLI)
#[derive(Args, Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file (":memory:" for an in-memory store)
    #[arg(long = "db", default_value = "corporations.db", env = "CORP_REGISTRY_DB")]
    pub database: PathBuf,

    /// Registry export imported when the store is empty
    #[arg(long, default_value = "corp.xml", env = "CORP_REGISTRY_SOURCE")]
    pub source: PathBuf,
}

/// HTTP listener settings
#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "CORP_REGISTRY_HOST")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "CORP_REGISTRY_PORT")]
    pub port: u16,

    /// Directory served under /static
    #[arg(long, default_value = "web", env = "CORP_REGISTRY_WEB_DIR")]
    pub web_dir: PathBuf,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Install the global tracing subscriber (RUST_LOG overrides the default filter)
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        store: StoreConfig,

        #[command(flatten)]
        server: ServerConfig,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["test"]).unwrap();

        assert_eq!(cli.store.source, PathBuf::from("corp.xml"));
        assert_eq!(cli.server.port, 8080);
        assert_eq!(cli.server.web_dir, PathBuf::from("web"));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "test", "--db", ":memory:", "--source", "/data/corp.xml", "--host", "127.0.0.1", "-p", "9000",
        ])
        .unwrap();

        assert_eq!(cli.store.database, PathBuf::from(":memory:"));
        assert_eq!(cli.store.source, PathBuf::from("/data/corp.xml"));
        assert_eq!(cli.server.socket_addr(), "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(TestCli::try_parse_from(["test", "--port", "not-a-port"]).is_err());
    }
}
