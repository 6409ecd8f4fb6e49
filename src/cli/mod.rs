//! CLI interface for the library catalog

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "library-catalog")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Library catalog REST service", long_about = None)]
pub struct Cli {
    /// Path to library.toml (searched upward from the current directory by default)
    #[arg(short, long, global = true, env = "LIBRARY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default library.toml with a fresh signing secret
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the database tables
    Migrate,

    /// Print the bcrypt hash of a password
    HashPassword {
        /// Plaintext password
        password: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["library-catalog", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli =
            Cli::try_parse_from(["library-catalog", "migrate", "--config", "/tmp/library.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/library.toml")));
        assert!(matches!(cli.command, Commands::Migrate));
    }
}
