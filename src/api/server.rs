//! HTTP API server

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AccessGuard, AuthService, PasswordHasher, SessionDirectory, TokenCodec};
use crate::config::Config;
use crate::error::Result;
use crate::store::{self, Store};

use super::{authors, books, routes, users};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub guard: AccessGuard,
}

impl AppState {
    /// Wire the auth components around an opened store
    pub fn new(config: Config, store: Arc<dyn Store>) -> Result<Self> {
        let codec = Arc::new(TokenCodec::from_config(&config.auth)?);
        let hasher = PasswordHasher::new(config.auth.bcrypt_cost);
        let sessions = SessionDirectory::new(store.clone());

        let auth = AuthService::new(store.clone(), hasher, codec.clone(), sessions.clone());
        let guard = AccessGuard::new(codec, sessions);

        Ok(Self {
            config,
            store,
            auth,
            guard,
        })
    }
}

pub type SharedState = Arc<AppState>;

impl FromRef<SharedState> for AccessGuard {
    fn from_ref(state: &SharedState) -> Self {
        state.guard.clone()
    }
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    if config.auth.uses_default_secret() {
        tracing::warn!("auth.secret is the built-in default; set LIBRARY_SECRET in production");
    }

    let store = store::connect(&config.database).await?;
    let state = Arc::new(AppState::new(config, store)?);

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        // Auth routes
        .route("/auth/register", post(routes::register))
        .route("/auth/login", post(routes::login))
        .route("/auth/logout", post(routes::logout))
        // Catalog routes
        .route(
            "/books",
            get(books::list_books)
                .post(books::create_book)
                .put(books::update_book),
        )
        .route("/books/{id}", get(books::get_book).delete(books::delete_book))
        .route(
            "/authors",
            get(authors::list_authors)
                .post(authors::create_author)
                .put(authors::update_author),
        )
        .route("/authors/{id}", get(authors::get_author).delete(authors::delete_author))
        // User administration
        .route("/users", get(users::list_users).put(users::update_user))
        .route("/users/{id}", get(users::get_user).delete(users::delete_user))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
