use std::env;
use std::fmt::Display;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;

/// Runtime configuration, read from the environment. A `.env` file is
/// honored when present; every value has a default suitable for local
/// development against the embedded database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string; the URL scheme selects the backend.
    pub database_url: String,
    /// Upper bound of the connection pool.
    pub max_connections: u32,
    /// Lower bound of the connection pool.
    pub min_connections: u32,
    /// Bounded wait for a pooled connection before the request fails.
    pub acquire_timeout: Duration,
    pub host: IpAddr,
    pub port: u16,
    /// Browser origin allowed by the CORS layer.
    pub cors_allowed_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: var_or("DATABASE_URL", "sqlite://todo.db".to_owned())?,
            max_connections: var_or("DB_MAX_CONNECTIONS", 10)?,
            min_connections: var_or("DB_MIN_CONNECTIONS", 0)?,
            acquire_timeout: Duration::from_secs(var_or("DB_ACQUIRE_TIMEOUT_SECS", 30)?),
            host: var_or("HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: var_or("PORT", 3000)?,
            cors_allowed_origin: var_or(
                "CORS_ALLOWED_ORIGIN",
                "http://localhost:3000".to_owned(),
            )?,
        })
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(anyhow::anyhow!("invalid value for {key}: {e}")),
    }
}
