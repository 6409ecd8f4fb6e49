//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "library.toml";

/// Load configuration from an explicit path, or from library.toml found by
/// searching upward from the current directory
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };
    tracing::debug!("Loading configuration from {}", config_path.display());
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Write a configuration file, refusing to clobber an existing one unless `force`
pub fn write_config_file(path: &Path, content: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    fs::write(path, content)?;
    Ok(())
}

/// Find the configuration file, searching upward from current directory
pub fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
pub fn interpolate_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(re
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

            env::var(var_name).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}

/// Generate a default configuration file content with the given signing secret
pub fn default_config_content(secret: &str) -> String {
    format!(
        r#"# Library Catalog Configuration

[server]
host = "0.0.0.0"
port = 8080

[database]
backend = "postgres"  # or "memory"
host = "${{DB_HOST:-localhost}}"
port = 5432
user = "${{DB_USER:-postgres}}"
password = "${{DB_PASSWORD:-postgres}}"
dbname = "library"
migrate_on_start = true

[auth]
secret = "${{LIBRARY_SECRET:-{secret}}}"
token_ttl_secs = 3600
bcrypt_cost = 12
"#
    )
}
