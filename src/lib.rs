//! Library catalog - books, authors and users behind token authentication
//!
//! This is the library interface for the catalog service: the HTTP router,
//! the authentication subsystem and the storage backends.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use store::Store;
