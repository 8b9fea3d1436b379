//! Configuration management for the shop directory service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with SHOPFINDER_ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::discovery::FilterDefaults;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Shop discovery limits
    pub discovery: DiscoveryConfig,

    /// First ADMIN account, created when the users table is empty
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL (PostGIS) connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapAdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Ceiling on a single discovery query, in seconds
    pub query_timeout_secs: u64,

    /// Page size used when the caller sends none
    pub default_page_size: u32,

    /// Largest page size a caller may request
    pub max_page_size: u32,

    /// Search radius in metres used when `max_dist` is absent
    pub default_max_distance: i64,
}

impl DiscoveryConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn filter_defaults(&self) -> FilterDefaults {
        FilterDefaults {
            page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            max_distance: self.default_max_distance,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: 3,
            default_page_size: 20,
            max_page_size: 100,
            default_max_distance: 10,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("SHOPFINDER_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 4000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("discovery.query_timeout_secs", 3)?
            .set_default("discovery.default_page_size", 20)?
            .set_default("discovery.max_page_size", 100)?
            .set_default("discovery.default_max_distance", 10)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SHOPFINDER_ prefix)
            .add_source(
                Environment::with_prefix("SHOPFINDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_defaults_match_filter_defaults() {
        let discovery = DiscoveryConfig::default();
        assert_eq!(discovery.filter_defaults(), FilterDefaults::default());
        assert_eq!(discovery.query_timeout(), Duration::from_secs(3));
    }
}
