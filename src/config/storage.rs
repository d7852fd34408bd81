//! Storage configuration types.

use serde::Deserialize;

use super::ConfigError;

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Sqlite,
    Postgres,
    /// In-process storage, lost on exit. Useful for demos and tests.
    Memory,
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// SQLite-specific configuration.
    pub sqlite: SqliteConfig,
    /// PostgreSQL-specific configuration.
    pub postgres: PostgresConfig,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before failing transiently.
    pub acquire_timeout_secs: u64,
    /// Maximum wait for a contended row lock, in milliseconds.
    ///
    /// Applied as PostgreSQL `lock_timeout` and SQLite `busy_timeout`.
    pub lock_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Sqlite,
            sqlite: SqliteConfig::default(),
            postgres: PostgresConfig::default(),
            max_connections: 10,
            acquire_timeout_secs: 5,
            lock_timeout_ms: 5000,
        }
    }
}

impl StorageConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_connections must be at least 1".to_string(),
            ));
        }
        match self.storage_type {
            StorageType::Sqlite if self.sqlite.path.trim().is_empty() => Err(
                ConfigError::Invalid("storage.sqlite.path must not be empty".to_string()),
            ),
            StorageType::Postgres if self.postgres.uri.trim().is_empty() => Err(
                ConfigError::Invalid("storage.postgres.uri must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// SQLite-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file path. Parent directories are created on startup.
    pub path: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "data/storefront.db".to_string(),
        }
    }
}

/// PostgreSQL-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// PostgreSQL connection URI.
    pub uri: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            uri: "postgres://localhost:5432/storefront".to_string(),
        }
    }
}
