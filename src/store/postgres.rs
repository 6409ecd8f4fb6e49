//! PostgreSQL store

use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Row};
use uuid::Uuid;

use super::filter::{AuthorFilter, BookFilter, UserFilter};
use super::{CatalogStore, UserStore};
use crate::auth::models::{NewUser, Role, User, UserUpdate};
use crate::catalog::{Author, AuthorBook, AuthorPayload, Book, BookAuthor, BookPayload};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id uuid PRIMARY KEY,
    name text NOT NULL UNIQUE,
    mail text NOT NULL UNIQUE,
    password text NOT NULL,
    role smallint NOT NULL CHECK (role BETWEEN 0 AND 2),
    created_at timestamptz NOT NULL DEFAULT now(),
    token text
);

CREATE TABLE IF NOT EXISTS authors (
    id uuid PRIMARY KEY,
    name text NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS books (
    id uuid PRIMARY KEY,
    name text NOT NULL,
    genre text NOT NULL,
    publication_date text NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now(),
    author_id uuid REFERENCES authors (id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS books_author_id_idx ON books (author_id);
"#;

const USER_COLUMNS: &str = "id, name, mail, password, role, created_at, token";

const BOOK_SELECT: &str = "SELECT b.id, b.name, b.publication_date, b.created_at, b.genre, \
     a.id, a.name, a.created_at \
     FROM books b LEFT JOIN authors a ON a.id = b.author_id";

/// Positional parameters for a dynamically built query
#[derive(Default)]
struct Params<'a> {
    values: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    fn push(&mut self, value: &'a (dyn ToSql + Sync)) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Literal substring match; `%` and `_` in the value carry no pattern meaning
    fn contains(&mut self, column: &str, value: &'a Option<String>, clauses: &mut Vec<String>) {
        if let Some(value) = value {
            let n = self.push(value);
            clauses.push(format!("strpos({column}, ${n}) > 0"));
        }
    }

    fn equal<T: ToSql + Sync>(&mut self, column: &str, value: &'a Option<T>, clauses: &mut Vec<String>) {
        if let Some(value) = value {
            let n = self.push(value);
            clauses.push(format!("{column} = ${n}"));
        }
    }
}

fn conjunction(keyword: &str, clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" {keyword} {}", clauses.join(" AND "))
    }
}

fn is_violation(err: &tokio_postgres::Error, state: &SqlState) -> bool {
    err.code() == Some(state)
}

fn user_from_row(row: &Row) -> Result<User> {
    let role: i16 = row.try_get("role")?;
    let role = Role::try_from(role).map_err(|e| Error::Other(e.to_string()))?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        mail: row.try_get("mail")?,
        role,
        created_at: row.try_get("created_at")?,
        password: row.try_get("password")?,
        token: row.try_get("token")?,
    })
}

fn book_from_row(row: &Row) -> Result<Book> {
    let author_id: Option<Uuid> = row.try_get(5)?;
    let author = match author_id {
        Some(id) => Some(BookAuthor {
            id,
            name: row.try_get(6)?,
            created_at: row.try_get(7)?,
        }),
        None => None,
    };
    Ok(Book {
        id: row.try_get(0)?,
        name: row.try_get(1)?,
        publication_date: row.try_get(2)?,
        created_at: row.try_get(3)?,
        genre: row.try_get(4)?,
        author,
    })
}

/// Fold `authors LEFT JOIN books` rows, ordered by author, into authors
fn authors_from_rows(rows: &[Row]) -> Result<Vec<Author>> {
    let mut authors: Vec<Author> = Vec::new();
    for row in rows {
        let id: Uuid = row.try_get(0)?;
        if authors.last().map(|a| a.id) != Some(id) {
            authors.push(Author {
                id,
                name: row.try_get(1)?,
                created_at: row.try_get(2)?,
                books: Vec::new(),
            });
        }
        let book_id: Option<Uuid> = row.try_get(3)?;
        if let (Some(book_id), Some(author)) = (book_id, authors.last_mut()) {
            author.books.push(AuthorBook {
                id: book_id,
                name: row.try_get(4)?,
                publication_date: row.try_get(5)?,
                created_at: row.try_get(6)?,
                genre: row.try_get(7)?,
            });
        }
    }
    Ok(authors)
}

/// Store on a single PostgreSQL connection
pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let (client, connection) =
            tokio_postgres::connect(&config.connection_string(), tokio_postgres::NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        tracing::info!(
            "Connected to PostgreSQL at {}:{}/{}",
            config.host,
            config.port,
            config.dbname
        );
        Ok(Self { client })
    }

    /// Create the tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        self.client.batch_execute(SCHEMA).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    async fn author_books(&self, where_clause: &str, params: &[&(dyn ToSql + Sync)], book_on: &str) -> Result<Vec<Author>> {
        let query = format!(
            "SELECT a.id, a.name, a.created_at, b.id, b.name, b.publication_date, b.created_at, b.genre \
             FROM authors a LEFT JOIN books b ON b.author_id = a.id{book_on}{where_clause} \
             ORDER BY a.created_at, a.id, b.created_at, b.id"
        );
        let rows = self.client.query(query.as_str(), params).await?;
        authors_from_rows(&rows)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn exists_with_name_or_mail(&self, name: &str, mail: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS(SELECT 1 FROM users WHERE name = $1 OR mail = $2)",
                &[&name, &mail],
            )
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (id, name, mail, password, role) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        let row = self
            .client
            .query_one(
                query.as_str(),
                &[
                    &Uuid::new_v4(),
                    &user.name,
                    &user.mail,
                    &user.password_hash,
                    &user.role.index(),
                ],
            )
            .await
            .map_err(|e| {
                if is_violation(&e, &SqlState::UNIQUE_VIOLATION) {
                    Error::BadRequest(format!("user {} already exists!", user.name))
                } else {
                    Error::Database(e)
                }
            })?;
        user_from_row(&row)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.client
            .query_opt(query.as_str(), &[&id])
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1");
        self.client
            .query_opt(query.as_str(), &[&name])
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let role = filter.role.map(Role::index);
        let mut params = Params::default();
        let mut clauses = Vec::new();
        params.contains("name", &filter.name, &mut clauses);
        params.contains("mail", &filter.mail, &mut clauses);
        params.equal("role", &role, &mut clauses);

        let query = format!(
            "SELECT {USER_COLUMNS} FROM users{} ORDER BY created_at, id",
            conjunction("WHERE", &clauses)
        );
        let rows = self.client.query(query.as_str(), &params.values).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn update_user(&self, update: UserUpdate) -> Result<User> {
        let query = format!(
            "UPDATE users SET name = $2, mail = $3, role = $4 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = self
            .client
            .query_opt(
                query.as_str(),
                &[&update.id, &update.name, &update.mail, &update.role.index()],
            )
            .await
            .map_err(|e| {
                if is_violation(&e, &SqlState::UNIQUE_VIOLATION) {
                    Error::BadRequest(format!("user {} already exists!", update.name))
                } else {
                    Error::Database(e)
                }
            })?;
        match row {
            Some(row) => user_from_row(&row),
            None => Err(Error::not_found("user", update.id)),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let deleted = self
            .client
            .execute("DELETE FROM users WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(Error::not_found("user", id));
        }
        Ok(())
    }

    async fn put_token(&self, id: Uuid, token: &str) -> Result<()> {
        self.client
            .execute("UPDATE users SET token = $2 WHERE id = $1", &[&id, &token])
            .await?;
        Ok(())
    }

    async fn clear_token(&self, id: Uuid) -> Result<()> {
        self.client
            .execute("UPDATE users SET token = NULL WHERE id = $1", &[&id])
            .await?;
        Ok(())
    }

    async fn get_user_by_session(&self, id: Uuid, role: Role, token: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE id = $1 AND role = $2 AND token = $3 AND token <> ''"
        );
        self.client
            .query_opt(query.as_str(), &[&id, &role.index(), &token])
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_author(&self, id: Uuid) -> Result<Option<Author>> {
        let authors = self.author_books(" WHERE a.id = $1", &[&id], "").await?;
        Ok(authors.into_iter().next())
    }

    async fn list_authors(&self, filter: &AuthorFilter) -> Result<Vec<Author>> {
        let mut params = Params::default();
        let mut book_clauses = Vec::new();
        let mut author_clauses = Vec::new();
        params.contains("b.name", &filter.book_name, &mut book_clauses);
        params.contains("b.genre", &filter.genre, &mut book_clauses);
        params.contains("a.name", &filter.author_name, &mut author_clauses);

        let authors = self
            .author_books(
                &conjunction("WHERE", &author_clauses),
                &params.values,
                &conjunction("AND", &book_clauses),
            )
            .await?;
        Ok(authors
            .into_iter()
            .filter(|author| !filter.filters_books() || !author.books.is_empty())
            .collect())
    }

    async fn create_author(&self, author: AuthorPayload) -> Result<Author> {
        let row = self
            .client
            .query_one(
                "INSERT INTO authors (id, name) VALUES ($1, $2) RETURNING id, name, created_at",
                &[&Uuid::new_v4(), &author.name],
            )
            .await?;
        Ok(Author {
            id: row.try_get(0)?,
            name: row.try_get(1)?,
            created_at: row.try_get(2)?,
            books: Vec::new(),
        })
    }

    async fn update_author(&self, id: Uuid, author: AuthorPayload) -> Result<Author> {
        let updated = self
            .client
            .execute("UPDATE authors SET name = $2 WHERE id = $1", &[&id, &author.name])
            .await?;
        if updated == 0 {
            return Err(Error::not_found("author", id));
        }
        self.get_author(id)
            .await?
            .ok_or_else(|| Error::not_found("author", id))
    }

    async fn delete_author(&self, id: Uuid) -> Result<()> {
        let deleted = self
            .client
            .execute("DELETE FROM authors WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(Error::not_found("author", id));
        }
        Ok(())
    }

    async fn get_book(&self, id: Uuid) -> Result<Option<Book>> {
        let query = format!("{BOOK_SELECT} WHERE b.id = $1");
        self.client
            .query_opt(query.as_str(), &[&id])
            .await?
            .as_ref()
            .map(book_from_row)
            .transpose()
    }

    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut params = Params::default();
        let mut clauses = Vec::new();
        params.contains("b.name", &filter.book_name, &mut clauses);
        params.contains("b.genre", &filter.genre, &mut clauses);
        params.equal("b.publication_date", &filter.publication_date, &mut clauses);
        params.contains("a.name", &filter.author_name, &mut clauses);

        let query = format!(
            "{BOOK_SELECT}{} ORDER BY b.created_at, b.id",
            conjunction("WHERE", &clauses)
        );
        let rows = self.client.query(query.as_str(), &params.values).await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn create_book(&self, book: BookPayload) -> Result<Book> {
        let id = Uuid::new_v4();
        self.client
            .execute(
                "INSERT INTO books (id, name, genre, publication_date, author_id) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[&id, &book.name, &book.genre, &book.publication_date, &book.author.id],
            )
            .await
            .map_err(|e| {
                if is_violation(&e, &SqlState::FOREIGN_KEY_VIOLATION) {
                    Error::not_found("author", book.author.id)
                } else {
                    Error::Database(e)
                }
            })?;
        self.get_book(id)
            .await?
            .ok_or_else(|| Error::not_found("book", id))
    }

    async fn update_book(&self, id: Uuid, book: BookPayload) -> Result<Book> {
        let updated = self
            .client
            .execute(
                "UPDATE books SET name = $2, genre = $3, publication_date = $4, author_id = $5 \
                 WHERE id = $1",
                &[&id, &book.name, &book.genre, &book.publication_date, &book.author.id],
            )
            .await
            .map_err(|e| {
                if is_violation(&e, &SqlState::FOREIGN_KEY_VIOLATION) {
                    Error::not_found("author", book.author.id)
                } else {
                    Error::Database(e)
                }
            })?;
        if updated == 0 {
            return Err(Error::not_found("book", id));
        }
        self.get_book(id)
            .await?
            .ok_or_else(|| Error::not_found("book", id))
    }

    async fn delete_book(&self, id: Uuid) -> Result<()> {
        let deleted = self
            .client
            .execute("DELETE FROM books WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(Error::not_found("book", id));
        }
        Ok(())
    }
}
