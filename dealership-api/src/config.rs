//! Service configuration
//!
//! Resolution order per setting: command line, then `DEALERSHIP_*`
//! environment variable (handled by clap), then the TOML file, then
//! compiled defaults.

use clap::Parser;
use dealership_common::config::TomlConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "dealership-api")]
#[command(about = "Dealership gateway: car catalog, dealer and review proxy, user sessions")]
#[command(version)]
pub struct Args {
    /// TOML config file
    #[arg(short, long, env = "DEALERSHIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "DEALERSHIP_DATABASE")]
    pub database: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "DEALERSHIP_BIND")]
    pub bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DEALERSHIP_PORT")]
    pub port: Option<u16>,

    /// Base URL of the dealer/review service
    #[arg(long, env = "DEALERSHIP_DEALER_URL")]
    pub dealer_url: Option<String>,

    /// Base URL of the sentiment service
    #[arg(long, env = "DEALERSHIP_SENTIMENT_URL")]
    pub sentiment_url: Option<String>,

    /// Timeout for each outbound request, in milliseconds
    #[arg(long, env = "DEALERSHIP_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,
}

/// Fully resolved settings the service runs with
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub dealer_service_url: String,
    pub sentiment_service_url: String,
    pub request_timeout: Duration,
    pub sentiment_concurrency: usize,
    pub session_ttl: chrono::Duration,
    pub log_level: String,
}

impl ServiceConfig {
    /// Load the config file named by `args` (or the default one) and apply overrides
    pub fn resolve(args: &Args) -> dealership_common::Result<Self> {
        let file = TomlConfig::load(args.config.as_deref())?;
        Self::merge(args, file)
    }

    /// Apply command-line overrides to an already loaded file config
    pub fn merge(args: &Args, mut file: TomlConfig) -> dealership_common::Result<Self> {
        if let Some(database) = &args.database {
            file.database_path = Some(database.clone());
        }
        if let Some(bind) = &args.bind {
            file.bind_address = bind.clone();
        }
        if let Some(port) = args.port {
            file.port = port;
        }
        if let Some(url) = &args.dealer_url {
            file.dealer_service_url = url.clone();
        }
        if let Some(url) = &args.sentiment_url {
            file.sentiment_service_url = url.clone();
        }
        if let Some(timeout_ms) = args.timeout_ms {
            file.request_timeout_ms = timeout_ms;
        }

        file.validate()?;

        Ok(Self {
            database_path: file.resolved_database_path(),
            bind_address: file.bind_address,
            port: file.port,
            dealer_service_url: file.dealer_service_url,
            sentiment_service_url: file.sentiment_service_url,
            request_timeout: Duration::from_millis(file.request_timeout_ms),
            sentiment_concurrency: file.sentiment_concurrency,
            session_ttl: chrono::Duration::hours(file.session_ttl_hours),
            log_level: file.logging.level,
        })
    }

    pub fn socket_addr(&self) -> dealership_common::Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| {
                dealership_common::Error::Config(format!(
                    "Invalid bind address {}:{}: {}",
                    self.bind_address, self.port, e
                ))
            })
    }
}
