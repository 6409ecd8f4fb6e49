//! Book and author records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author with the books attributed to them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub books: Vec<AuthorBook>,
}

/// Book as listed under its author
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorBook {
    pub id: Uuid,
    pub name: String,
    pub publication_date: String,
    pub created_at: DateTime<Utc>,
    pub genre: String,
}

/// Book with its author, if it still has one
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub name: String,
    pub publication_date: String,
    pub created_at: DateTime<Utc>,
    pub genre: String,
    pub author: Option<BookAuthor>,
}

/// Author as embedded in a book
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAuthor {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Reference to an existing author inside a book payload
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
}

/// Body of `POST /books` and `PUT /books`; `id` is only read on update
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub genre: String,
    pub publication_date: String,
    pub author: AuthorRef,
}

/// Body of `POST /authors` and `PUT /authors`; `id` is only read on update
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorPayload {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_payload_shape() {
        let author = Uuid::new_v4();
        let json = serde_json::json!({
            "name": "Dune",
            "genre": "sci-fi",
            "publicationDate": "1965-08-01",
            "author": { "id": author }
        });
        let payload: BookPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.id, None);
        assert_eq!(payload.author.id, author);
        assert_eq!(payload.publication_date, "1965-08-01");
    }

    #[test]
    fn test_book_without_author_serializes_null() {
        let book = Book {
            id: Uuid::new_v4(),
            name: "Orphan".to_string(),
            publication_date: "2000".to_string(),
            created_at: Utc::now(),
            genre: "misc".to_string(),
            author: None,
        };
        let json = serde_json::to_value(&book).unwrap();
        assert!(json["author"].is_null());
        assert_eq!(json["publicationDate"], "2000");
    }
}
