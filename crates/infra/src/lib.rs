//! Infrastructure layer: storage backends and configuration.

pub mod config;
pub mod store;

pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use store::{InMemoryDatabase, PostgresDatabase};
