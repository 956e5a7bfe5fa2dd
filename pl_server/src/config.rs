//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use pool_league::db::DatabaseConfig;
use pool_league::tournament::{DEFAULT_RACE_TO, MAX_RACE_TO, MIN_RACE_TO};
use std::net::SocketAddr;
use std::str::FromStr;

/// Bind address used when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: SocketAddr = SocketAddr::V4(std::net::SocketAddrV4::new(
    std::net::Ipv4Addr::LOCALHOST,
    8080,
));

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration (unused with the memory backend)
    pub database: DatabaseConfig,
    /// Where tournaments are stored
    pub storage: StorageBackend,
    /// Prometheus exporter address, disabled when `None`
    pub metrics_bind: Option<SocketAddr>,
    /// Values applied to new tournaments that leave them out
    pub defaults: TournamentDefaults,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local, lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid {
                var: "STORAGE_BACKEND".to_string(),
                reason: format!("Expected 'postgres' or 'memory', got '{other}'"),
            }),
        }
    }
}

/// Defaults for tournament creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentDefaults {
    /// Frames needed to win a match
    pub race_to: u32,
    /// Full round-robin cycles
    pub round_robin_cycles: u32,
}

impl Default for TournamentDefaults {
    fn default() -> Self {
        Self {
            race_to: DEFAULT_RACE_TO,
            round_robin_cycles: 1,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `storage_override` - Optional storage backend override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        storage_override: Option<StorageBackend>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_opt("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database = database.with_url(url);
        }

        let storage = match storage_override {
            Some(storage) => storage,
            None => match std::env::var("STORAGE_BACKEND") {
                Ok(value) => value.parse()?,
                Err(_) => StorageBackend::Postgres,
            },
        };

        let metrics_bind = parse_env_opt("METRICS_BIND")?;

        let fallback = TournamentDefaults::default();
        let defaults = TournamentDefaults {
            race_to: parse_env_opt("DEFAULT_RACE_TO")?.unwrap_or(fallback.race_to),
            round_robin_cycles: parse_env_opt("DEFAULT_ROUND_ROBIN_CYCLES")?
                .unwrap_or(fallback.round_robin_cycles),
        };

        Ok(ServerConfig {
            bind,
            database,
            storage,
            metrics_bind,
            defaults,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RACE_TO..=MAX_RACE_TO).contains(&self.defaults.race_to) {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_RACE_TO".to_string(),
                reason: format!("Must be between {MIN_RACE_TO} and {MAX_RACE_TO}"),
            });
        }

        if self.defaults.round_robin_cycles == 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_ROUND_ROBIN_CYCLES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.storage == StorageBackend::Postgres
            && self.database.min_connections > self.database.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed DB_MAX_CONNECTIONS ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an optional environment variable, failing if it is set but malformed
fn parse_env_opt<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}
