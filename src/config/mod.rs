//! Configuration management

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("Unknown LOG_FORMAT '{}' (expected 'pretty' or 'json')", other),
        }
    }
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL (e.g. `sqlite://data/app.db` or `sqlite::memory:`)
    pub database_url: String,

    /// Maximum pool size. In-memory databases always use a single connection.
    pub max_connections: u32,

    /// How long to keep retrying the initial connection
    pub connect_timeout: Duration,

    /// Tracing output format
    pub log_format: LogFormat,

    /// Filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 10,
            connect_timeout: Duration::from_secs(30),
            log_format: LogFormat::Pretty,
            log_filter: "orm_resolver=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),

            max_connections: match env::var("DATABASE_MAX_CONNECTIONS") {
                Ok(v) => v.parse().context("Invalid DATABASE_MAX_CONNECTIONS")?,
                Err(_) => defaults.max_connections,
            },

            connect_timeout: match env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
                Ok(v) => Duration::from_secs(
                    v.parse().context("Invalid DATABASE_CONNECT_TIMEOUT_SECS")?,
                ),
                Err(_) => defaults.connect_timeout,
            },

            log_format: match env::var("LOG_FORMAT") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.log_format,
            },

            log_filter: env::var("LOG_FILTER").unwrap_or(defaults.log_filter),
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Pool size actually used for this database
    pub fn effective_max_connections(&self) -> u32 {
        if self.is_in_memory() {
            // Every connection to `:memory:` opens its own empty database
            1
        } else {
            self.max_connections.max(1)
        }
    }
}
