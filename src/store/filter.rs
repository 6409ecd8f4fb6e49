//! List filters built from query parameters

use std::collections::HashMap;

use crate::auth::models::Role;
use crate::error::{Error, Result};

fn invalid_params() -> Error {
    Error::BadRequest("Invalid request params".to_string())
}

fn reject_unknown(params: &HashMap<String, String>, allowed: &[&str]) -> Result<()> {
    if params.keys().all(|key| allowed.contains(&key.as_str())) {
        Ok(())
    } else {
        tracing::debug!("Rejected query params: {:?}", params.keys().collect::<Vec<_>>());
        Err(invalid_params())
    }
}

/// Case-sensitive substring test, the in-memory twin of `LIKE '%' || $n || '%'`
pub fn contains(haystack: &str, needle: &Option<String>) -> bool {
    needle.as_deref().map_or(true, |n| haystack.contains(n))
}

/// `GET /books` filter; names and genre match by substring, date exactly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub book_name: Option<String>,
    pub genre: Option<String>,
    pub publication_date: Option<String>,
    pub author_name: Option<String>,
}

impl BookFilter {
    pub const PARAMS: [&'static str; 4] = ["book_name", "genre", "publication_date", "author_name"];

    pub fn from_params(mut params: HashMap<String, String>) -> Result<Self> {
        reject_unknown(&params, &Self::PARAMS)?;
        Ok(Self {
            book_name: params.remove("book_name"),
            genre: params.remove("genre"),
            publication_date: params.remove("publication_date"),
            author_name: params.remove("author_name"),
        })
    }

    /// Whether the book-level predicates can only match books that have an author
    pub fn requires_author(&self) -> bool {
        self.author_name.is_some()
    }
}

/// `GET /authors` filter; all substring matches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorFilter {
    pub author_name: Option<String>,
    pub book_name: Option<String>,
    pub genre: Option<String>,
}

impl AuthorFilter {
    pub const PARAMS: [&'static str; 3] = ["author_name", "book_name", "genre"];

    pub fn from_params(mut params: HashMap<String, String>) -> Result<Self> {
        reject_unknown(&params, &Self::PARAMS)?;
        Ok(Self {
            author_name: params.remove("author_name"),
            book_name: params.remove("book_name"),
            genre: params.remove("genre"),
        })
    }

    /// Whether the filter looks at the author's books
    pub fn filters_books(&self) -> bool {
        self.book_name.is_some() || self.genre.is_some()
    }
}

/// `GET /users` filter; name and mail by substring, role exactly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub name: Option<String>,
    pub mail: Option<String>,
    pub role: Option<Role>,
}

impl UserFilter {
    pub const PARAMS: [&'static str; 3] = ["name", "mail", "role"];

    pub fn from_params(mut params: HashMap<String, String>) -> Result<Self> {
        reject_unknown(&params, &Self::PARAMS)?;
        let role = params
            .remove("role")
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|index| Role::try_from(index).ok())
                    .ok_or_else(invalid_params)
            })
            .transpose()?;
        Ok(Self {
            name: params.remove("name"),
            mail: params.remove("mail"),
            role,
        })
    }
}
