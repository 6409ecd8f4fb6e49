//! Authentication and session management

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod session;

pub use error::{AuthError, Credential};
pub use jwt::{Claims, TokenCodec};
pub use middleware::{authorization_header, bearer_token, AccessGuard, Authenticated, Invoker};
pub use models::{LoginRequest, NewUser, Principal, RegisterRequest, Role, User, UserUpdate};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use session::SessionDirectory;
