//! Shared extract helpers plus the health and auth handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::server::SharedState;
use crate::auth::{authorization_header, AuthError, LoginRequest, RegisterRequest, User};
use crate::error::{Error, Result};

/// Unwrap a JSON body, reporting any decode failure as 400
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(Error::BadRequest(rejection.body_text()))
        }
    }
}

/// Unwrap a `{id}` path segment
pub fn path_id(path: std::result::Result<Path<Uuid>, PathRejection>) -> Result<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}

/// Unwrap the raw query parameters
pub fn query_params(
    query: std::result::Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<HashMap<String, String>> {
    query
        .map(|Query(params)| params)
        .map_err(|_| Error::BadRequest("Invalid request params".to_string()))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// Health check

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

// Auth routes

pub async fn register(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let req = json_body(payload)?;
    let user = state.auth.register(req).await?;
    Ok(Json(user))
}

/// Responds with the bare token as the body
pub async fn login(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<String> {
    let req = json_body(payload)?;
    let token = state.auth.login(req, Utc::now()).await?;
    Ok(token)
}

pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Result<()> {
    match state.auth.logout(authorization_header(&headers)).await {
        Ok(()) => Ok(()),
        Err(AuthError::MissingCredentials) => Err(Error::BadRequest(
            "Authorization header wasn't provided".to_string(),
        )),
        Err(e) => {
            tracing::info!("Logout rejected: {}", e);
            Err(e.into())
        }
    }
}
