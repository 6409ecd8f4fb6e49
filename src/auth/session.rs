//! Session management
//!
//! Each user has at most one live token on record. Login overwrites it, logout
//! clears it, and a token only authenticates while it is the one on record.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::error::{AuthError, Result};
use crate::auth::models::{Role, User};
use crate::store::{Store, UserStore};

/// Persistent subject id → live token mapping
#[derive(Clone)]
pub struct SessionDirectory {
    store: Arc<dyn Store>,
}

impl SessionDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record `token` as the subject's only live session; last writer wins
    pub async fn put(&self, id: Uuid, token: &str) -> Result<()> {
        self.store.put_token(id, token).await?;
        tracing::debug!("Stored session for user {}", id);
        Ok(())
    }

    /// Drop the subject's live session; clearing an empty session succeeds
    pub async fn clear(&self, id: Uuid) -> Result<()> {
        self.store.clear_token(id).await?;
        tracing::debug!("Cleared session for user {}", id);
        Ok(())
    }

    /// The user whose live session is exactly `token` under this id and role.
    ///
    /// A miss is [`AuthError::InvalidToken`], never a storage failure.
    pub async fn lookup(&self, id: Uuid, role: Role, token: &str) -> Result<User> {
        match self.store.get_user_by_session(id, role, token).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthError::InvalidToken),
            Err(e) => Err(AuthError::StorageFailure(e.to_string())),
        }
    }
}
