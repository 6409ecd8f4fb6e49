//! Authentication and authorization failures

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use thiserror::Error;

use crate::auth::models::Role;

/// Which half of a name/password pair was rejected at login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    Username,
    Password,
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Username => write!(f, "username"),
            Credential::Password => write!(f, "password"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("empty Authorization header")]
    MissingCredentials,

    #[error("wrong header value")]
    MalformedHeader,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token is expired")]
    Expired,

    /// Token is well formed and signed but is not the subject's live session
    #[error("invalid token")]
    InvalidToken,

    #[error("wrong {0}")]
    WrongCredentials(Credential),

    #[error("403 Forbidden")]
    Forbidden { required: Role, actual: Role },

    #[error("failed to hash password: {0}")]
    HashingFailure(String),

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::HashingFailure(_)
            | AuthError::Signing(_)
            | AuthError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// True for the rejections produced while decoding a token or matching it
    /// against the session on record
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken(_)
                | AuthError::BadSignature
                | AuthError::Expired
                | AuthError::InvalidToken
        )
    }
}

impl From<crate::error::Error> for AuthError {
    fn from(err: crate::error::Error) -> Self {
        match err {
            crate::error::Error::Auth(e) => e,
            other => AuthError::StorageFailure(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Authentication failed: {}", self);
            return (status, "Internal Server Error").into_response();
        }
        tracing::debug!("Rejected request: {}", self);
        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
