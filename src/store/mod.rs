//! Persistence for users, sessions and the catalog
//!
//! Two backends implement the same traits: [`PostgresStore`] for deployments
//! and [`MemoryStore`] for tests and throwaway instances.

pub mod filter;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::models::{NewUser, Role, User, UserUpdate};
use crate::catalog::{Author, AuthorPayload, Book, BookPayload};
use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::error::Result;

pub use filter::{AuthorFilter, BookFilter, UserFilter};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// User accounts and their session column
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists_with_name_or_mail(&self, name: &str, mail: &str) -> Result<bool>;

    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>>;

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>>;

    /// Fails with `NotFound` for an unknown id and `BadRequest` when the new
    /// name or mail belongs to someone else
    async fn update_user(&self, update: UserUpdate) -> Result<User>;

    async fn delete_user(&self, id: Uuid) -> Result<()>;

    /// Overwrite the live session token
    async fn put_token(&self, id: Uuid, token: &str) -> Result<()>;

    /// Forget the live session token
    async fn clear_token(&self, id: Uuid) -> Result<()>;

    /// The user with this id and role whose live session is `token`
    async fn get_user_by_session(&self, id: Uuid, role: Role, token: &str) -> Result<Option<User>>;
}

/// Books and authors
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_author(&self, id: Uuid) -> Result<Option<Author>>;

    async fn list_authors(&self, filter: &AuthorFilter) -> Result<Vec<Author>>;

    async fn create_author(&self, author: AuthorPayload) -> Result<Author>;

    async fn update_author(&self, id: Uuid, author: AuthorPayload) -> Result<Author>;

    /// Books by a deleted author stay in the catalog without an author
    async fn delete_author(&self, id: Uuid) -> Result<()>;

    async fn get_book(&self, id: Uuid) -> Result<Option<Book>>;

    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>>;

    /// Fails with `NotFound` when the referenced author does not exist
    async fn create_book(&self, book: BookPayload) -> Result<Book>;

    async fn update_book(&self, id: Uuid, book: BookPayload) -> Result<Book>;

    async fn delete_book(&self, id: Uuid) -> Result<()>;
}

/// Everything the service persists
pub trait Store: UserStore + CatalogStore {}

impl<T: UserStore + CatalogStore> Store for T {}

/// Open the configured backend
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Store>> {
    match config.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Postgres => {
            let store = PostgresStore::connect(config).await?;
            if config.migrate_on_start {
                store.migrate().await?;
            }
            Ok(Arc::new(store))
        }
    }
}
