//! Configuration loading and representation.
//!
//! Settings come from the process environment, optionally seeded from a `.env`
//! file in the working directory:
//!
//! | Variable             | Default               |
//! |----------------------|-----------------------|
//! | `DATABASE_URL`       | `sqlite://catalog.db` |
//! | `DB_MAX_CONNECTIONS` | `5`                   |
//! | `BIND_ADDR`          | `0.0.0.0`             |
//! | `PORT`               | `3001`                |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://catalog.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a valid number (got `{value}`)")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be a valid IP address (got `{value}`)")]
    InvalidAddress { key: &'static str, value: String },

    #[error("{key} cannot be empty")]
    Empty { key: &'static str },
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// In-memory SQLite databases live inside a single connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Listener settings for the RPC front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Full service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

impl CatalogConfig {
    /// Load from the process environment (after applying `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        if url.trim().is_empty() {
            return Err(ConfigError::Empty { key: "DATABASE_URL" });
        }

        let max_connections = parse_number(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidAddress {
                key: "BIND_ADDR",
                value: raw.clone(),
            })?,
            None => DEFAULT_BIND_ADDR,
        };

        let port = parse_number(&lookup, "PORT", DEFAULT_PORT)?;

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections,
            },
            server: ServerConfig { bind_addr, port },
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        None => Ok(default),
    }
}
