//! User administration handlers

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
use crate::auth::{Authenticated, Invoker, Role, User, UserUpdate};
use crate::error::{Error, Result};
use crate::store::{UserFilter, UserStore};

pub async fn list_users(
    admin: Invoker,
    State(state): State<SharedState>,
    query: std::result::Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<User>>> {
    admin.require_role(Role::Admin)?;
    let filter = UserFilter::from_params(query_params(query)?)?;
    let users = state.store.list_users(&filter).await?;
    Ok(Json(users))
}

/// Any signed-in user may look up an account
pub async fn get_user(
    Authenticated(_): Authenticated,
    State(state): State<SharedState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<User>> {
    let id = path_id(path)?;
    state
        .store
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("user", id))
}

pub async fn update_user(
    admin: Invoker,
    State(state): State<SharedState>,
    payload: std::result::Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<User>> {
    admin.require_role(Role::Admin)?;
    let user = state.store.update_user(json_body(payload)?).await?;

    tracing::info!("User {} updated by {}", user.id, admin.0.name);
    Ok(Json(user))
}

pub async fn delete_user(
    admin: Invoker,
    State(state): State<SharedState>,
    path: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode> {
    admin.require_role(Role::Admin)?;
    let id = path_id(path)?;
    state.store.delete_user(id).await?;

    tracing::info!("User {} deleted by {}", id, admin.0.name);
    Ok(StatusCode::NO_CONTENT)
}
