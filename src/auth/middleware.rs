//! Authentication guard and extractors

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::auth::error::{AuthError, Result};
use crate::auth::jwt::TokenCodec;
use crate::auth::models::{Principal, Role, User};
use crate::auth::session::SessionDirectory;

/// Raw `Authorization` header value; empty when absent or not valid text
pub fn authorization_header(headers: &HeaderMap) -> &str {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Split `<scheme> <token>` and return the token segment.
///
/// The scheme itself is not checked.
pub fn bearer_token(header: &str) -> Result<&str> {
    if header.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    let mut parts = header.split(' ');
    match (parts.next(), parts.next()) {
        (Some(_scheme), Some(token)) => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Decides whether a request carries a live session
#[derive(Clone)]
pub struct AccessGuard {
    codec: Arc<TokenCodec>,
    sessions: SessionDirectory,
}

impl AccessGuard {
    pub fn new(codec: Arc<TokenCodec>, sessions: SessionDirectory) -> Self {
        Self { codec, sessions }
    }

    /// Identity behind an `Authorization` header value
    pub async fn authenticate(&self, header: &str, now: DateTime<Utc>) -> Result<Principal> {
        self.authenticate_and_fetch_user(header, now)
            .await
            .map(|user| user.principal())
    }

    /// Same checks as [`authenticate`](Self::authenticate), returning the stored user
    pub async fn authenticate_and_fetch_user(&self, header: &str, now: DateTime<Utc>) -> Result<User> {
        let token = bearer_token(header)?;
        let principal = self.codec.verify(token, now)?;
        self.sessions.lookup(principal.id, principal.role, token).await
    }

    /// Exact role match; a higher role does not stand in for a lower one
    pub fn require_role(principal: &Principal, required: Role) -> Result<()> {
        if principal.role == required {
            Ok(())
        } else {
            tracing::info!(
                "User {} with role {} denied {} operation",
                principal.id,
                principal.role,
                required
            );
            Err(AuthError::Forbidden {
                required,
                actual: principal.role,
            })
        }
    }
}

/// Extractor for any caller with a live session
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    AccessGuard: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let guard = AccessGuard::from_ref(state);
        let principal = guard
            .authenticate(authorization_header(&parts.headers), Utc::now())
            .await?;
        Ok(Authenticated(principal))
    }
}

/// Extractor for the full stored record of the calling user
#[derive(Debug, Clone)]
pub struct Invoker(pub User);

impl Invoker {
    pub fn require_role(&self, required: Role) -> Result<()> {
        AccessGuard::require_role(&self.0.principal(), required)
    }
}

impl<S> FromRequestParts<S> for Invoker
where
    AccessGuard: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let guard = AccessGuard::from_ref(state);
        let user = guard
            .authenticate_and_fetch_user(authorization_header(&parts.headers), Utc::now())
            .await?;
        Ok(Invoker(user))
    }
}
