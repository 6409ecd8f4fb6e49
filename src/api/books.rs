//! Book handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::routes::{json_body, path_id, query_params};
use super::server::SharedState;
use crate::auth::{AccessGuard, Authenticated, Role};
use crate::catalog::{Book, BookPayload};
use crate::error::{Error, Result};
use crate::store::{BookFilter, CatalogStore};

pub async fn list_books(
    Authenticated(_): Authenticated,
    State(state): State<SharedState>,
    query: std::result::Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<Book>>> {
    let filter = BookFilter::from_params(query_params(query)?)?;
    let books = state.store.list_books(&filter).await?;
    Ok(Json(books))
}

pub async fn get_book(
    Authenticated(_): Authenticated,
    State(state): State<SharedState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Book>> {
    let id = path_id(path)?;
    state
        .store
        .get_book(id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("book", id))
}

pub async fn create_book(
    Authenticated(principal): Authenticated,
    State(state): State<SharedState>,
    payload: std::result::Result<Json<BookPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>)> {
    AccessGuard::require_role(&principal, Role::Moderator)?;
    let book = state.store.create_book(json_body(payload)?).await?;

    tracing::info!("Book {} created by {}", book.id, principal.id);
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    Authenticated(principal): Authenticated,
    State(state): State<SharedState>,
    payload: std::result::Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Book>> {
    AccessGuard::require_role(&principal, Role::Moderator)?;
    let payload = json_body(payload)?;
    let id = payload
        .id
        .ok_or_else(|| Error::BadRequest("book id is required".to_string()))?;
    let book = state.store.update_book(id, payload).await?;

    tracing::info!("Book {} updated by {}", book.id, principal.id);
    Ok(Json(book))
}

pub async fn delete_book(
    Authenticated(principal): Authenticated,
    State(state): State<SharedState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode> {
    AccessGuard::require_role(&principal, Role::Moderator)?;
    let id = path_id(path)?;
    state.store.delete_book(id).await?;

    tracing::info!("Book {} deleted by {}", id, principal.id);
    Ok(StatusCode::NO_CONTENT)
}
