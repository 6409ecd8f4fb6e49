//! CLI command implementations

use anyhow::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::auth::password::{PasswordHasher, DEFAULT_COST};
use crate::cli::{error, info, success, warn};
use crate::config::{self, loader, Config, DatabaseBackend};
use crate::store::PostgresStore;

/// Random signing secret for a fresh config file
pub fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Initialize a new library.toml configuration file
pub async fn init(path: Option<&Path>, force: bool) -> Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(config::CONFIG_FILENAME));

    if config_path.exists() && !force {
        warn(&format!("{} already exists", config_path.display()));
        return Ok(());
    }

    let content = config::default_config_content(&generate_secret());
    loader::write_config_file(&config_path, &content, force)?;

    success(&format!("Created {}", config_path.display()));
    info("Edit the [database] section and run 'library-catalog serve' to start the API");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(path)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

/// Create the database tables
pub async fn migrate(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;

    if config.database.backend == DatabaseBackend::Memory {
        warn("database.backend is \"memory\"; nothing to migrate");
        return Ok(());
    }

    info(&format!(
        "Migrating {}:{}/{}",
        config.database.host, config.database.port, config.database.dbname
    ));

    let store = match PostgresStore::connect(&config.database).await {
        Ok(store) => store,
        Err(e) => {
            error(&format!("Failed to connect to PostgreSQL: {}", e));
            return Err(e.into());
        }
    };
    store.migrate().await?;

    success("Database schema is up to date");
    Ok(())
}

/// Print the bcrypt hash of a password, using the configured cost when a
/// config file is available
pub async fn hash_password(path: Option<&Path>, password: String) -> Result<()> {
    let cost = match config::load_config(path) {
        Ok(config) => config.auth.bcrypt_cost,
        Err(_) => DEFAULT_COST,
    };

    let digest = PasswordHasher::new(cost).hash_blocking(password).await?;
    println!("{}", digest);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    config::load_config(path).map_err(|e| {
        error(&format!("Failed to load config: {}", e));
        e.into()
    })
}
