//! HTTP API integration tests
//! Drives the router in-process against the in-memory store
//!
//! Run with: cargo test --test api_tests

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use library_catalog::api::{create_router, AppState};
use library_catalog::config::{Config, DatabaseBackend};
use library_catalog::store::{MemoryStore, Store};

fn test_config() -> Config {
    let mut config = Config::default();
    config.database.backend = DatabaseBackend::Memory;
    config.auth.secret = "api-test-secret".to_string();
    config.auth.bcrypt_cost = 4;
    config
}

fn test_app() -> Router {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(test_config(), store).unwrap());
    create_router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn register(app: &Router, name: &str, role: i64) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": name,
            "mail": format!("{}@x.com", name),
            "password": "pw123",
            "role": role
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    serde_json::from_str(&body).unwrap()
}

/// Register and log in, returning the `Authorization` header value
async fn sign_in(app: &Router, name: &str, role: i64) -> String {
    register(app, name, role).await;
    let (status, token) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "name": name, "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    format!("Bearer {}", token)
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("healthy"));
}

#[tokio::test]
async fn test_user_session_lifecycle() {
    let app = test_app();

    let user = register(&app, "alice", 0).await;
    assert_eq!(user["name"], "alice");
    assert_eq!(user["role"], 0);
    assert!(user.get("password").is_none());
    assert!(user.get("token").is_none());

    let (status, token) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "name": "alice", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token.split('.').count(), 3);
    let auth = format!("Bearer {}", token);

    let (status, _) = send(&app, Method::GET, "/books", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);

    // USER may not create authors
    let (status, body) = send(
        &app,
        Method::POST,
        "/authors",
        Some(&auth),
        Some(json!({ "name": "Frank Herbert" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "403 Forbidden");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/books", Some(&auth), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "invalid token");
}

#[tokio::test]
async fn test_login_failures() {
    let app = test_app();
    register(&app, "alice", 0).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "name": "bob", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "wrong username");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "name": "alice", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "wrong password");
}

#[tokio::test]
async fn test_register_duplicate() {
    let app = test_app();
    register(&app, "alice", 0).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "name": "alice", "mail": "other@x.com", "password": "pw", "role": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "user alice already exists!");
}

#[tokio::test]
async fn test_register_bad_body() {
    let app = test_app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "name": "alice", "role": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_header_failures() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "empty Authorization header");

    let (status, body) = send(&app, Method::GET, "/books", Some("Bearer"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "wrong header value");

    let (status, _) = send(&app, Method::GET, "/books", Some("Bearer not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_relogin_supersedes_previous_token() {
    let app = test_app();
    let first = sign_in(&app, "alice", 0).await;

    // immediately, within the same second
    let (status, token) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "name": "alice", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = format!("Bearer {}", token);
    assert_ne!(first, second);

    let (status, _) = send(&app, Method::GET, "/books", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/books", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_header_handling() {
    let app = test_app();

    let (status, body) = send(&app, Method::POST, "/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Authorization header wasn't provided");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some("Bearer garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_catalog_crud_as_moderator() {
    let app = test_app();
    let moderator = sign_in(&app, "mod", 1).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/authors",
        Some(&moderator),
        Some(json!({ "name": "Frank Herbert" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let author: Value = serde_json::from_str(&body).unwrap();
    let author_id = author["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(&moderator),
        Some(json!({
            "name": "Dune",
            "genre": "sci-fi",
            "publicationDate": "1965",
            "author": { "id": author_id }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let book: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(book["author"]["name"], "Frank Herbert");
    let book_id = book["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/books",
        Some(&moderator),
        Some(json!({
            "id": book_id,
            "name": "Dune Messiah",
            "genre": "sci-fi",
            "publicationDate": "1969",
            "author": { "id": author_id }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Dune Messiah"));

    let (status, body) = send(
        &app,
        Method::GET,
        "/books?author_name=Herbert",
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let books: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(books.len(), 1);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/authors/{}", author_id),
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let author: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(author["books"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/authors/{}", author_id),
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/books/{}", book_id),
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let book: Value = serde_json::from_str(&body).unwrap();
    assert!(book["author"].is_null());

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/books/{}", book_id),
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/books/{}", book_id),
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, format!("book with id {} wasn't found", book_id));
}

#[tokio::test]
async fn test_admin_is_not_a_moderator() {
    let app = test_app();
    let admin = sign_in(&app, "root", 2).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/authors",
        Some(&admin),
        Some(json!({ "name": "Frank Herbert" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_book_with_unknown_author() {
    let app = test_app();
    let moderator = sign_in(&app, "mod", 1).await;
    let missing = uuid::Uuid::new_v4();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(&moderator),
        Some(json!({
            "name": "Dune",
            "genre": "sci-fi",
            "publicationDate": "1965",
            "author": { "id": missing }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, format!("author with id {} wasn't found", missing));
}

#[tokio::test]
async fn test_invalid_query_params() {
    let app = test_app();
    let user = sign_in(&app, "alice", 0).await;

    let (status, body) = send(&app, Method::GET, "/books?title=Dune", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid request params");

    let (status, _) = send(&app, Method::GET, "/authors?publication_date=1965", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_administration() {
    let app = test_app();
    let admin = sign_in(&app, "root", 2).await;
    let alice = sign_in(&app, "alice", 0).await;

    let (status, _) = send(&app, Method::GET, "/users", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/users?role=0", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "alice");
    let alice_id = users[0]["id"].as_str().unwrap().to_string();

    // any signed-in user may read a single account
    let (status, body) = send(&app, Method::GET, &format!("/users/{}", alice_id), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("pw123"));

    let (status, body) = send(
        &app,
        Method::PUT,
        "/users",
        Some(&admin),
        Some(json!({ "id": alice_id, "name": "alice", "mail": "alice@x.com", "role": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(updated["role"], 1);

    // the session was issued for role USER and no longer matches
    let (status, _) = send(&app, Method::GET, "/books", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", alice_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/users/{}", alice_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_path_id() {
    let app = test_app();
    let user = sign_in(&app, "alice", 0).await;
    let (status, _) = send(&app, Method::GET, "/books/not-a-uuid", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
