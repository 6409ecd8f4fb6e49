//! Author handlers

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
use crate::catalog::{Author, AuthorPayload};
use crate::error::{Error, Result};
use crate::store::{AuthorFilter, CatalogStore};

pub async fn list_authors(
    Authenticated(_): Authenticated,
    State(state): State<SharedState>,
    query: std::result::Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<Author>>> {
    let filter = AuthorFilter::from_params(query_params(query)?)?;
    let authors = state.store.list_authors(&filter).await?;
    Ok(Json(authors))
}

pub async fn get_author(
    Authenticated(_): Authenticated,
    State(state): State<SharedState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Author>> {
    let id = path_id(path)?;
    state
        .store
        .get_author(id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("author", id))
}

pub async fn create_author(
    Authenticated(principal): Authenticated,
    State(state): State<SharedState>,
    payload: std::result::Result<Json<AuthorPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Author>)> {
    AccessGuard::require_role(&principal, Role::Moderator)?;
    let author = state.store.create_author(json_body(payload)?).await?;

    tracing::info!("Author {} created by {}", author.id, principal.id);
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    Authenticated(principal): Authenticated,
    State(state): State<SharedState>,
    payload: std::result::Result<Json<AuthorPayload>, JsonRejection>,
) -> Result<Json<Author>> {
    AccessGuard::require_role(&principal, Role::Moderator)?;
    let payload = json_body(payload)?;
    let id = payload
        .id
        .ok_or_else(|| Error::BadRequest("author id is required".to_string()))?;
    let author = state.store.update_author(id, payload).await?;

    tracing::info!("Author {} updated by {}", author.id, principal.id);
    Ok(Json(author))
}

/// Books by the author stay, without an author
pub async fn delete_author(
    Authenticated(principal): Authenticated,
    State(state): State<SharedState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode> {
    AccessGuard::require_role(&principal, Role::Moderator)?;
    let id = path_id(path)?;
    state.store.delete_author(id).await?;

    tracing::info!("Author {} deleted by {}", id, principal.id);
    Ok(StatusCode::NO_CONTENT)
}
