use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_connection_string: String,
    pub bind_addr: String,
    pub public_url: String,
    /// Upper bound for opening and acquiring database connections.
    pub db_timeout_secs: u64,
    pub db_max_connections: u32,
}

const DEFAULT_DB_CONNECTION_STRING: &str = "sqlite://db.sqlite?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
const DEFAULT_DB_TIMEOUT_SECS: u64 = 5;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;

impl Default for Config {
    fn default() -> Self {
        Config {
            db_connection_string: DEFAULT_DB_CONNECTION_STRING.into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            public_url: DEFAULT_PUBLIC_URL.into(),
            db_timeout_secs: DEFAULT_DB_TIMEOUT_SECS,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Config::default();
        Ok(Config {
            db_connection_string: lookup("DB_CONNECTION_STRING")
                .unwrap_or(defaults.db_connection_string),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_url: lookup("PUBLIC_URL").unwrap_or(defaults.public_url),
            db_timeout_secs: parse_or(&lookup, "DB_TIMEOUT_SECS", defaults.db_timeout_secs)?,
            db_max_connections: parse_or(
                &lookup,
                "DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.db_connection_string.is_empty() {
            return Err("DB_CONNECTION_STRING is empty".into());
        }
        if SocketAddr::from_str(&self.bind_addr).is_err() {
            return Err(format!("BIND_ADDR is not a socket address: {}", self.bind_addr));
        }
        if self.db_timeout_secs == 0 {
            return Err("DB_TIMEOUT_SECS must be greater than zero".into());
        }
        if self.db_max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be greater than zero".into());
        }
        Ok(())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        None => Ok(default),
    }
}
