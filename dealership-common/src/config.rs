//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, applied by the service binary)
//! 2. Environment variable (applied by the service binary through clap)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Longest accepted session lifetime (one year)
///
/// Larger values overflow the session expiry arithmetic.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Bootstrap configuration loaded from TOML
///
/// Every key is optional in the file; missing keys fall back to the
/// compiled defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Path to SQLite database file
    pub database_path: Option<PathBuf>,

    /// Interface the HTTP server binds to
    pub bind_address: String,

    /// HTTP server port
    pub port: u16,

    /// Base URL of the external dealer/review service
    pub dealer_service_url: String,

    /// Base URL of the sentiment analysis service
    pub sentiment_service_url: String,

    /// Timeout applied to every outbound request
    pub request_timeout_ms: u64,

    /// Maximum in-flight sentiment calls while enriching one review listing
    pub sentiment_concurrency: usize,

    /// Lifetime of a sign-in session
    pub session_ttl_hours: i64,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            dealer_service_url: "http://localhost:3030".to_string(),
            sentiment_service_url: "http://localhost:5050".to_string(),
            request_timeout_ms: 10_000,
            sentiment_concurrency: 4,
            session_ttl_hours: 24,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load bootstrap configuration
    ///
    /// An explicitly requested file must exist. Without one, the platform
    /// config file is used when present, otherwise compiled defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_file() {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Database path, falling back to the OS data directory
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            return Err(Error::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.sentiment_concurrency == 0 {
            return Err(Error::Config(
                "sentiment_concurrency must be at least 1".to_string(),
            ));
        }
        if self.session_ttl_hours <= 0 || self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(Error::Config(format!(
                "session_ttl_hours must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            )));
        }
        for (key, url) in [
            ("dealer_service_url", &self.dealer_service_url),
            ("sentiment_service_url", &self.sentiment_service_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    key, url
                )));
            }
        }
        Ok(())
    }
}

/// Locate the platform config file, if one exists
///
/// Linux checks `~/.config/dealership/config.toml` then
/// `/etc/dealership/config.toml`.
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("dealership").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/dealership/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dealership"))
        .unwrap_or_else(|| PathBuf::from("./dealership_data"))
        .join("dealership.db")
}
