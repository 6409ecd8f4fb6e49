//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::auth::jwt::MAX_TTL_SECS;
use crate::auth::password::COST_RANGE;
use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which store the server runs on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Memory,
}

/// Database connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default = "default_db_password")]
    pub password: String,

    #[serde(default = "default_dbname")]
    pub dbname: String,

    /// Create missing tables when the server starts
    #[serde(default = "default_migrate_on_start")]
    pub migrate_on_start: bool,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_dbname() -> String {
    "library".to_string()
}

fn default_migrate_on_start() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: default_db_password(),
            dbname: default_dbname(),
            migrate_on_start: default_migrate_on_start(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("dbname", &self.dbname)
            .field("migrate_on_start", &self.migrate_on_start)
            .finish()
    }
}

impl DatabaseConfig {
    /// Key/value connection string understood by `tokio_postgres::connect`
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

/// Token signing and password hashing settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens
    #[serde(default = "default_secret")]
    pub secret: String,

    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_secret() -> String {
    "library-catalog-secret-change-in-production".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_bcrypt_cost() -> u32 {
    12
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            token_ttl_secs: default_token_ttl_secs(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AuthConfig {
    /// Whether the secret is still the shipped placeholder
    pub fn uses_default_secret(&self) -> bool {
        self.secret == default_secret()
    }
}

impl Config {
    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret.is_empty() {
            return Err(Error::Config("auth.secret must not be empty".to_string()));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(Error::Config(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.token_ttl_secs > MAX_TTL_SECS {
            return Err(Error::Config(format!(
                "auth.token_ttl_secs must be at most {}, got {}",
                MAX_TTL_SECS, self.auth.token_ttl_secs
            )));
        }
        if !COST_RANGE.contains(&self.auth.bcrypt_cost) {
            return Err(Error::Config(format!(
                "auth.bcrypt_cost must be between {} and {}, got {}",
                COST_RANGE.start(),
                COST_RANGE.end(),
                self.auth.bcrypt_cost
            )));
        }
        if self.database.backend == DatabaseBackend::Postgres && self.database.dbname.is_empty() {
            return Err(Error::Config("database.dbname must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert!(config.auth.uses_default_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [database]
            backend = "memory"

            [auth]
            secret = "s3cret"
            bcrypt_cost = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert!(!config.auth.uses_default_secret());
    }

    #[test]
    fn test_validate_rejects_bad_cost() {
        let mut config = Config::default();
        config.auth.bcrypt_cost = 2;
        assert!(config.validate().is_err());
        config.auth.bcrypt_cost = 4;
        config.auth.token_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_token_ttl() {
        let mut config = Config::default();
        config.auth.token_ttl_secs = 10_000_000_000_000;
        assert!(config.validate().is_err());
        config.auth.token_ttl_secs = MAX_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::default();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("library-catalog-secret"));
        assert!(!debug.contains("password: \"postgres\""));
    }
}
