//! In-memory store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::filter::{contains, AuthorFilter, BookFilter, UserFilter};
use super::{CatalogStore, UserStore};
use crate::auth::models::{NewUser, Role, User, UserUpdate};
use crate::catalog::{Author, AuthorBook, AuthorPayload, Book, BookAuthor, BookPayload};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct AuthorRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct BookRow {
    id: Uuid,
    name: String,
    genre: String,
    publication_date: String,
    created_at: DateTime<Utc>,
    author_id: Option<Uuid>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    authors: HashMap<Uuid, AuthorRow>,
    books: HashMap<Uuid, BookRow>,
}

impl Tables {
    fn name_or_mail_taken(&self, name: &str, mail: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && (u.name == name || u.mail == mail))
    }

    fn book(&self, row: &BookRow) -> Book {
        let author = row
            .author_id
            .and_then(|id| self.authors.get(&id))
            .map(|a| BookAuthor {
                id: a.id,
                name: a.name.clone(),
                created_at: a.created_at,
            });
        Book {
            id: row.id,
            name: row.name.clone(),
            publication_date: row.publication_date.clone(),
            created_at: row.created_at,
            genre: row.genre.clone(),
            author,
        }
    }

    fn author(&self, row: &AuthorRow, keep: impl Fn(&BookRow) -> bool) -> Author {
        let mut books: Vec<&BookRow> = self
            .books
            .values()
            .filter(|b| b.author_id == Some(row.id) && keep(b))
            .collect();
        books.sort_by_key(|b| (b.created_at, b.id));
        Author {
            id: row.id,
            name: row.name.clone(),
            created_at: row.created_at,
            books: books
                .into_iter()
                .map(|b| AuthorBook {
                    id: b.id,
                    name: b.name.clone(),
                    publication_date: b.publication_date.clone(),
                    created_at: b.created_at,
                    genre: b.genre.clone(),
                })
                .collect(),
        }
    }
}

/// Store backed by hash maps behind one lock
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
        }
    }

    /// Number of users with a live session
    pub async fn live_session_count(&self) -> usize {
        self.tables
            .read()
            .await
            .users
            .values()
            .filter(|u| u.has_live_session())
            .count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn exists_with_name_or_mail(&self, name: &str, mail: &str) -> Result<bool> {
        Ok(self.tables.read().await.name_or_mail_taken(name, mail, None))
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.name_or_mail_taken(&user.name, &user.mail, None) {
            return Err(Error::BadRequest(format!("user {} already exists!", user.name)));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            mail: user.mail,
            role: user.role,
            created_at: Utc::now(),
            password: user.password_hash,
            token: None,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.name == name)
            .cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| contains(&u.name, &filter.name) && contains(&u.mail, &filter.mail))
            .filter(|u| filter.role.map_or(true, |role| u.role == role))
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn update_user(&self, update: UserUpdate) -> Result<User> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&update.id) {
            return Err(Error::not_found("user", update.id));
        }
        if tables.name_or_mail_taken(&update.name, &update.mail, Some(update.id)) {
            return Err(Error::BadRequest(format!("user {} already exists!", update.name)));
        }
        let user = tables
            .users
            .get_mut(&update.id)
            .ok_or_else(|| Error::not_found("user", update.id))?;
        user.name = update.name;
        user.mail = update.mail;
        user.role = update.role;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        match self.tables.write().await.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(Error::not_found("user", id)),
        }
    }

    async fn put_token(&self, id: Uuid, token: &str) -> Result<()> {
        if let Some(user) = self.tables.write().await.users.get_mut(&id) {
            user.token = Some(token.to_string());
        }
        Ok(())
    }

    async fn clear_token(&self, id: Uuid) -> Result<()> {
        if let Some(user) = self.tables.write().await.users.get_mut(&id) {
            user.token = None;
        }
        Ok(())
    }

    async fn get_user_by_session(&self, id: Uuid, role: Role, token: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .get(&id)
            .filter(|u| u.role == role && u.has_live_session() && u.token.as_deref() == Some(token))
            .cloned())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_author(&self, id: Uuid) -> Result<Option<Author>> {
        let tables = self.tables.read().await;
        Ok(tables.authors.get(&id).map(|row| tables.author(row, |_| true)))
    }

    async fn list_authors(&self, filter: &AuthorFilter) -> Result<Vec<Author>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&AuthorRow> = tables
            .authors
            .values()
            .filter(|a| contains(&a.name, &filter.author_name))
            .collect();
        rows.sort_by_key(|a| (a.created_at, a.id));

        let authors = rows
            .into_iter()
            .map(|row| {
                tables.author(row, |b| {
                    contains(&b.name, &filter.book_name) && contains(&b.genre, &filter.genre)
                })
            })
            // a book predicate can only match through an actual book
            .filter(|author| !filter.filters_books() || !author.books.is_empty())
            .collect();
        Ok(authors)
    }

    async fn create_author(&self, author: AuthorPayload) -> Result<Author> {
        let mut tables = self.tables.write().await;
        let row = AuthorRow {
            id: Uuid::new_v4(),
            name: author.name,
            created_at: Utc::now(),
        };
        tables.authors.insert(row.id, row.clone());
        Ok(tables.author(&row, |_| true))
    }

    async fn update_author(&self, id: Uuid, author: AuthorPayload) -> Result<Author> {
        let mut tables = self.tables.write().await;
        let row = tables
            .authors
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("author", id))?;
        row.name = author.name;
        let row = row.clone();
        Ok(tables.author(&row, |_| true))
    }

    async fn delete_author(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.authors.remove(&id).is_none() {
            return Err(Error::not_found("author", id));
        }
        for book in tables.books.values_mut() {
            if book.author_id == Some(id) {
                book.author_id = None;
            }
        }
        Ok(())
    }

    async fn get_book(&self, id: Uuid) -> Result<Option<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.get(&id).map(|row| tables.book(row)))
    }

    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&BookRow> = tables
            .books
            .values()
            .filter(|b| contains(&b.name, &filter.book_name) && contains(&b.genre, &filter.genre))
            .filter(|b| {
                filter
                    .publication_date
                    .as_ref()
                    .map_or(true, |date| &b.publication_date == date)
            })
            .collect();
        rows.sort_by_key(|b| (b.created_at, b.id));

        let books = rows
            .into_iter()
            .map(|row| tables.book(row))
            .filter(|book| match &book.author {
                Some(author) => contains(&author.name, &filter.author_name),
                None => !filter.requires_author(),
            })
            .collect();
        Ok(books)
    }

    async fn create_book(&self, book: BookPayload) -> Result<Book> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&book.author.id) {
            return Err(Error::not_found("author", book.author.id));
        }
        let row = BookRow {
            id: Uuid::new_v4(),
            name: book.name,
            genre: book.genre,
            publication_date: book.publication_date,
            created_at: Utc::now(),
            author_id: Some(book.author.id),
        };
        tables.books.insert(row.id, row.clone());
        Ok(tables.book(&row))
    }

    async fn update_book(&self, id: Uuid, book: BookPayload) -> Result<Book> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&book.author.id) {
            return Err(Error::not_found("author", book.author.id));
        }
        let row = tables
            .books
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("book", id))?;
        row.name = book.name;
        row.genre = book.genre;
        row.publication_date = book.publication_date;
        row.author_id = Some(book.author.id);
        let row = row.clone();
        Ok(tables.book(&row))
    }

    async fn delete_book(&self, id: Uuid) -> Result<()> {
        match self.tables.write().await.books.remove(&id) {
            Some(_) => Ok(()),
            None => Err(Error::not_found("book", id)),
        }
    }
}
