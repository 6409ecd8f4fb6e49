//! Error scenario and edge case tests
//! Checks how failures map onto HTTP statuses and response bodies
//!
//! Run with: cargo test --test error_scenarios_tests

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use library_catalog::auth::{AuthError, Credential, Role};
use library_catalog::error::Error;

async fn render(response: axum::response::Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[test]
fn test_error_config_not_found() {
    let err = Error::ConfigNotFound;
    assert!(err.to_string().contains("Config file not found"));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_auth_statuses() {
    assert_eq!(AuthError::MissingCredentials.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AuthError::MalformedHeader.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AuthError::Expired.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        AuthError::WrongCredentials(Credential::Username).status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        AuthError::Forbidden {
            required: Role::Moderator,
            actual: Role::Admin
        }
        .status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        AuthError::StorageFailure("down".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_not_found_response() {
    let (status, body) = render(Error::not_found("book", "42").into_response()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "book with id 42 wasn't found");
}

#[tokio::test]
async fn test_internal_errors_are_not_leaked() {
    let (status, body) = render(Error::Other("connection refused at 10.0.0.5".to_string()).into_response()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");

    let (status, body) =
        render(Error::Auth(AuthError::StorageFailure("pg down".to_string())).into_response()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
}

#[tokio::test]
async fn test_auth_error_passes_through() {
    let (status, body) = render(Error::from(AuthError::WrongCredentials(Credential::Password)).into_response()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "wrong password");
}

#[test]
fn test_crate_error_into_auth_error() {
    let err: AuthError = Error::Other("boom".to_string()).into();
    assert!(matches!(err, AuthError::StorageFailure(_)));

    let err: AuthError = Error::Auth(AuthError::Expired).into();
    assert!(matches!(err, AuthError::Expired));
    assert!(err.is_token_rejection());
}
