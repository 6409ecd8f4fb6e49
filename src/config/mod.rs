//! Configuration management for the library catalog

pub mod loader;
mod schema;

pub use loader::{default_config_content, load_config, load_config_from_path, CONFIG_FILENAME};
pub use schema::*;
