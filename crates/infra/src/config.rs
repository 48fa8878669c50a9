//! Process configuration read from environment variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `STOCKROOM_BIND` | `0.0.0.0:8080` | HTTP listen address |
//! | `STOCKROOM_SHUTDOWN_TIMEOUT_SECS` | `10` | Grace period for in-flight requests |
//! | `USE_PERSISTENT_STORES` | `false` | Use Postgres instead of in-memory stores |
//! | `DATABASE_URL` | (required when persistent) | Postgres connection string |
//! | `DB_MAX_CONNECTIONS` | `10` | Pool upper bound |
//! | `DB_MIN_CONNECTIONS` | `0` | Idle connections kept open |
//! | `DB_ACQUIRE_TIMEOUT_MS` | `5000` | Wait for a pooled connection |

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 0;
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres(DatabaseConfig),
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

// Connection strings carry credentials.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or("STOCKROOM_BIND", get("STOCKROOM_BIND"), || {
            SocketAddr::from_str(DEFAULT_BIND_ADDR).map_err(|e| e.to_string())
        })?;
        let shutdown_secs = parse_or(
            "STOCKROOM_SHUTDOWN_TIMEOUT_SECS",
            get("STOCKROOM_SHUTDOWN_TIMEOUT_SECS"),
            || Ok(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        )?;

        let persistent = match get("USE_PERSISTENT_STORES") {
            None => false,
            Some(v) => parse_bool("USE_PERSISTENT_STORES", &v)?,
        };

        let storage = if persistent {
            StorageConfig::Postgres(database_config(&get)?)
        } else {
            StorageConfig::InMemory
        };

        Ok(Self {
            server: ServerConfig {
                bind_addr,
                shutdown_timeout: Duration::from_secs(shutdown_secs),
            },
            storage,
        })
    }
}

fn database_config<G>(get: &G) -> Result<DatabaseConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
    let max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), || {
        Ok(DEFAULT_MAX_CONNECTIONS)
    })?;
    let min_connections = parse_or("DB_MIN_CONNECTIONS", get("DB_MIN_CONNECTIONS"), || {
        Ok(DEFAULT_MIN_CONNECTIONS)
    })?;
    let acquire_ms = parse_or("DB_ACQUIRE_TIMEOUT_MS", get("DB_ACQUIRE_TIMEOUT_MS"), || {
        Ok(DEFAULT_ACQUIRE_TIMEOUT_MS)
    })?;

    if max_connections == 0 {
        return Err(ConfigError::Invalid {
            var: "DB_MAX_CONNECTIONS",
            reason: "must be at least 1".to_string(),
        });
    }
    if min_connections > max_connections {
        return Err(ConfigError::Invalid {
            var: "DB_MIN_CONNECTIONS",
            reason: format!("{min_connections} exceeds DB_MAX_CONNECTIONS ({max_connections})"),
        });
    }

    Ok(DatabaseConfig {
        url,
        max_connections,
        min_connections,
        acquire_timeout: Duration::from_millis(acquire_ms),
    })
}

fn parse_or<T, D>(var: &'static str, raw: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    D: FnOnce() -> Result<T, String>,
{
    match raw {
        Some(v) => v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: format!("{v:?}: {e}"),
        }),
        None => default().map_err(|reason| ConfigError::Invalid { var, reason }),
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            reason: format!("{other:?} is not a boolean"),
        }),
    }
}
