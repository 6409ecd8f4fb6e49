//! Catalog entities: books and authors

pub mod models;

pub use models::{Author, AuthorBook, AuthorPayload, AuthorRef, Book, BookAuthor, BookPayload};
