//! JWT token handling

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::auth::error::{AuthError, Result};
use crate::auth::models::{Principal, Role};
use crate::config::AuthConfig;

/// The only signing algorithm tokens are issued with or accepted under
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Longest token lifetime accepted from configuration (ten years)
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub id: String,
    /// Role index
    pub role: i64,
    /// Absolute expiry, Unix seconds
    pub expired_at: i64,
    /// Per-issue nonce, so two logins in the same second differ
    #[serde(default)]
    pub jti: Uuid,
}

impl Claims {
    pub fn new(id: Uuid, role: Role, expires: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            role: role.into(),
            expired_at: expires.timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    /// Parse the embedded identity
    pub fn principal(&self) -> Result<Principal> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| AuthError::MalformedToken(format!("invalid subject id: {}", e)))?;
        let role = Role::try_from(self.role).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        Ok(Principal { id, role })
    }

    /// A token is live on `[issued, expired_at)`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expired_at
    }
}

/// Issues and verifies HS256 session tokens under one process-wide secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry lives in `expired_at` and is checked against an injected clock
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> crate::error::Result<Self> {
        if config.secret.is_empty() {
            return Err(crate::error::Error::Config(
                "auth.secret must not be empty".to_string(),
            ));
        }
        let ttl = i64::try_from(config.token_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .filter(|ttl| *ttl > Duration::zero() && config.token_ttl_secs <= MAX_TTL_SECS)
            .ok_or_else(|| {
                crate::error::Error::Config(format!(
                    "auth.token_ttl_secs out of range: {}",
                    config.token_ttl_secs
                ))
            })?;
        Ok(Self::new(config.secret.as_bytes(), ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a token for the subject, expiring `ttl` after `now`
    pub fn issue(&self, id: Uuid, role: Role, now: DateTime<Utc>) -> Result<String> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing(format!("expiry {} after {} is out of range", self.ttl, now)))?;
        let claims = Claims::new(id, role, expires);
        encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Check structure, algorithm and signature without looking at expiry
    pub fn decode(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(classify)
    }

    /// Identity of a correctly signed token, expired or not
    pub fn identify(&self, token: &str) -> Result<Principal> {
        self.decode(token)?.principal()
    }

    /// Validate a token at `now` and return the identity it carries
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Principal> {
        let claims = self.decode(token)?;
        let principal = claims.principal()?;
        if claims.is_expired_at(now) {
            tracing::debug!("Token for {} expired at {}", principal.id, claims.expired_at);
            return Err(AuthError::Expired);
        }
        Ok(principal)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        ErrorKind::InvalidAlgorithm => {
            AuthError::MalformedToken("unexpected signing algorithm".to_string())
        }
        _ => AuthError::MalformedToken(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &[u8] = b"test-secret";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::seconds(3600))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_issue_and_verify_token() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec.issue(id, Role::Admin, at(1_000)).expect("Failed to create token");
        assert_eq!(token.split('.').count(), 3);

        let principal = codec.verify(&token, at(1_000)).expect("Failed to validate token");
        assert_eq!(principal, Principal { id, role: Role::Admin });
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec.issue(id, Role::User, at(1_000)).unwrap();

        assert!(codec.verify(&token, at(1_000 + 3599)).is_ok());
        assert!(matches!(
            codec.verify(&token, at(1_000 + 3600)),
            Err(AuthError::Expired)
        ));
        assert!(matches!(
            codec.verify(&token, at(1_000 + 7200)),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_claims_wire_format() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec.issue(id, Role::Moderator, at(50)).unwrap();
        let claims = codec.decode(&token).unwrap();

        assert_eq!(claims.id, id.to_string());
        assert_eq!(claims.role, 1);
        assert_eq!(claims.expired_at, 3650);
    }

    #[test]
    fn test_identify_ignores_expiry() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec.issue(id, Role::User, at(0)).unwrap();
        assert!(matches!(codec.verify(&token, at(10_000)), Err(AuthError::Expired)));
        assert_eq!(codec.identify(&token).unwrap().id, id);
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let other = TokenCodec::new(b"other-secret", Duration::seconds(3600));
        let token = other.issue(Uuid::new_v4(), Role::User, at(0)).unwrap();
        assert!(matches!(codec().verify(&token, at(1)), Err(AuthError::BadSignature)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        for token in ["", "not-a-jwt-token", "invalid.token.here", "a.b"] {
            assert!(
                matches!(codec.verify(token, at(0)), Err(AuthError::MalformedToken(_))),
                "{:?} should be malformed",
                token
            );
        }
    }

    #[test]
    fn test_other_hmac_algorithm_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), Role::Admin, at(10_000));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(matches!(
            codec().verify(&token, at(0)),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_unsigned_token_is_rejected() {
        // {"alg":"none","typ":"JWT"} . {"id":"6f1c...","role":2,"expired_at":4102444800} .
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJpZCI6IjZmMWMyZDhlLTNiNGEtNGM1ZC05ZTZmLTdhOGI5YzBkMWUyZiIsInJvbGUiOjIsImV4cGlyZWRfYXQiOjQxMDI0NDQ4MDB9.";
        assert!(matches!(
            codec().verify(token, at(0)),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_out_of_range_role_is_malformed() {
        let claims = Claims {
            id: Uuid::new_v4().to_string(),
            role: 9,
            expired_at: 10_000,
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(SECRET)).unwrap();
        assert!(matches!(
            codec().verify(&token, at(0)),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_non_uuid_subject_is_malformed() {
        let claims = Claims {
            id: "alice".to_string(),
            role: 0,
            expired_at: 10_000,
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(SECRET)).unwrap();
        assert!(matches!(
            codec().verify(&token, at(0)),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_same_second_tokens_differ() {
        let codec = codec();
        let id = Uuid::new_v4();
        let first = codec.issue(id, Role::User, at(1_000)).unwrap();
        let second = codec.issue(id, Role::User, at(1_000)).unwrap();
        assert_ne!(first, second);
        assert_eq!(codec.verify(&first, at(1_000)).unwrap(), codec.verify(&second, at(1_000)).unwrap());
    }

    #[test]
    fn test_token_without_nonce_still_verifies() {
        #[derive(Serialize)]
        struct Bare {
            id: String,
            role: i64,
            expired_at: i64,
        }
        let id = Uuid::new_v4();
        let bare = Bare {
            id: id.to_string(),
            role: 2,
            expired_at: 10_000,
        };
        let token = encode(&Header::new(ALGORITHM), &bare, &EncodingKey::from_secret(SECRET)).unwrap();
        assert_eq!(codec().verify(&token, at(0)).unwrap(), Principal { id, role: Role::Admin });
    }

    #[test]
    fn test_unrepresentable_expiry_is_signing_error() {
        let codec = TokenCodec::new(SECRET, Duration::days(365 * 1_000_000));
        assert!(matches!(
            codec.issue(Uuid::new_v4(), Role::User, Utc::now()),
            Err(AuthError::Signing(_))
        ));
    }

    #[test]
    fn test_from_config_rejects_huge_ttl() {
        let mut config = AuthConfig::default();
        config.token_ttl_secs = 10_000_000_000_000;
        assert!(TokenCodec::from_config(&config).is_err());

        config.token_ttl_secs = MAX_TTL_SECS;
        assert!(TokenCodec::from_config(&config).is_ok());
    }

    #[test]
    fn test_from_config_rejects_empty_secret() {
        let mut config = AuthConfig::default();
        config.secret.clear();
        assert!(TokenCodec::from_config(&config).is_err());

        let codec = TokenCodec::from_config(&AuthConfig::default()).unwrap();
        assert_eq!(codec.ttl(), Duration::seconds(3600));
    }
}
