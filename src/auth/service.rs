//! Registration, login and logout

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::auth::error::{AuthError, Credential};
use crate::auth::jwt::TokenCodec;
use crate::auth::middleware::bearer_token;
use crate::auth::models::{LoginRequest, NewUser, RegisterRequest, User};
use crate::auth::password::PasswordHasher;
use crate::auth::session::SessionDirectory;
use crate::error::{Error, Result};
use crate::store::{Store, UserStore};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
    codec: Arc<TokenCodec>,
    sessions: SessionDirectory,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: PasswordHasher,
        codec: Arc<TokenCodec>,
        sessions: SessionDirectory,
    ) -> Self {
        Self {
            store,
            hasher,
            codec,
            sessions,
        }
    }

    /// Create an account; name and mail must both be unused
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        tracing::info!("Registering user: {:?}", req);

        if req.name.trim().is_empty() || req.mail.trim().is_empty() {
            return Err(Error::BadRequest("name and mail are required".to_string()));
        }

        if self.store.exists_with_name_or_mail(&req.name, &req.mail).await? {
            tracing::warn!("Registration rejected, user exists: {}", req.name);
            return Err(Error::BadRequest(format!("user {} already exists!", req.name)));
        }

        let password_hash = self.hasher.hash_blocking(req.password).await?;
        let user = self
            .store
            .create_user(NewUser {
                name: req.name,
                mail: req.mail,
                password_hash,
                role: req.role,
            })
            .await?;

        tracing::info!("Registered user {} ({}) as {}", user.name, user.id, user.role);
        Ok(user)
    }

    /// Check credentials, mint a token and make it the user's only live session
    pub async fn login(&self, req: LoginRequest, now: DateTime<Utc>) -> std::result::Result<String, AuthError> {
        tracing::info!("Login request for: {}", req.name);

        let user = self
            .store
            .get_user_by_name(&req.name)
            .await?
            .ok_or(AuthError::WrongCredentials(Credential::Username))?;

        if !self
            .hasher
            .verify_blocking(req.password, user.password.clone())
            .await?
        {
            tracing::warn!("Invalid password for user: {}", req.name);
            return Err(AuthError::WrongCredentials(Credential::Password));
        }

        let token = self.codec.issue(user.id, user.role, now)?;
        self.sessions.put(user.id, &token).await?;

        tracing::info!("User logged in: {} ({})", user.name, user.id);
        Ok(token)
    }

    /// Clear the session named by the header's token.
    ///
    /// The token must be correctly signed but may already be expired.
    pub async fn logout(&self, header: &str) -> std::result::Result<(), AuthError> {
        let token = bearer_token(header)?;
        let principal = self.codec.identify(token)?;
        self.sessions.clear(principal.id).await?;

        tracing::info!("User logged out: {}", principal.id);
        Ok(())
    }
}
