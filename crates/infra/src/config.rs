//! Configuration loading and representation.
//!
//! Everything comes from environment variables; `from_lookup` takes any
//! key→value source so tests don't touch the process environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Reads `JWT_SECRET`, `BIND_ADDR`, `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let database = match lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
            Some(url) => {
                let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                    Some(raw) => match raw.parse::<u32>() {
                        Ok(0) | Err(_) => {
                            return Err(ConfigError::Invalid {
                                key: "DATABASE_MAX_CONNECTIONS",
                                value: raw,
                                reason: "expected a positive integer".to_string(),
                            });
                        }
                        Ok(n) => n,
                    },
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                Some(DatabaseConfig {
                    url,
                    max_connections,
                })
            }
            None => None,
        };

        Ok(Self {
            jwt_secret,
            bind_addr,
            database,
        })
    }
}
