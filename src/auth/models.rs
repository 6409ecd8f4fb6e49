//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// User roles for authorization, stored and transmitted as their index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Role {
    /// Can read the catalog
    User,
    /// Can manage books and authors
    Moderator,
    /// Can manage user accounts
    Admin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role index {0}")]
pub struct UnknownRole(pub i64);

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    /// Privilege index: 0 for USER, 1 for MODERATOR, 2 for ADMIN
    pub fn index(self) -> i16 {
        match self {
            Role::User => 0,
            Role::Moderator => 1,
            Role::Admin => 2,
        }
    }
}

impl TryFrom<i64> for Role {
    type Error = UnknownRole;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::User),
            1 => Ok(Role::Moderator),
            2 => Ok(Role::Admin),
            other => Err(UnknownRole(other)),
        }
    }
}

impl TryFrom<i16> for Role {
    type Error = UnknownRole;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Role::try_from(i64::from(value))
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        i64::from(role.index())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Moderator => write!(f, "MODERATOR"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Identity derived from a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

/// Stored user account.
///
/// The password hash and the live session token never leave the process:
/// both are skipped on serialization and redacted from `Debug`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub mail: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub token: Option<String>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
        }
    }

    pub fn has_live_session(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mail", &self.mail)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("live_session", &self.has_live_session())
            .finish()
    }
}

/// A user about to be inserted, with the password already hashed
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub mail: String,
    pub password_hash: String,
    pub role: Role,
}

/// Registration payload
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub mail: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name: {}, mail: {}, role: {}", self.name, self.mail, self.role)
    }
}

/// Login credentials
#[derive(Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name: {}", self.name)
    }
}

/// Administrative update of an account's profile and role
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub id: Uuid,
    pub name: String,
    pub mail: String,
    pub role: Role,
}
