//! HTTP API server

pub mod authors;
pub mod books;
pub mod routes;
pub mod server;
pub mod users;

pub use server::*;
