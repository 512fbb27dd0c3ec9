pub mod email;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::types::Role;

pub use email::{display_name, EmailPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub role: Role,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub user_id: Uuid,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Token lifetime out of range: {0}")]
    InvalidTtl(&'static str),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}

/// Issues and verifies HS256 access and refresh tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        let access_ttl = Duration::try_minutes(security.access_token_ttl_minutes)
            .ok_or(AuthError::InvalidTtl("JWT_ACCESS_TTL_MINUTES"))?;
        let refresh_ttl = Duration::try_hours(security.refresh_token_ttl_hours)
            .ok_or(AuthError::InvalidTtl("JWT_REFRESH_TTL_HOURS"))?;
        Self::new(&security.jwt_secret, access_ttl, refresh_ttl)
    }

    pub fn issue_access(&self, user_id: Uuid, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            role,
            kind: TokenKind::Access,
            exp: (now + self.access_ttl).timestamp(),
            iat: now.timestamp(),
        };
        self.sign(&claims)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            user_id,
            kind: TokenKind::Refresh,
            exp: (now + self.refresh_ttl).timestamp(),
            iat: now.timestamp(),
        };
        self.sign(&claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        let claims: Claims = decode(token, &self.decoding, &Validation::default())?.claims;
        expect_kind(claims.kind, TokenKind::Access)?;
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let claims: RefreshClaims = decode(token, &self.decoding, &Validation::default())?.claims;
        expect_kind(claims.kind, TokenKind::Refresh)?;
        Ok(claims)
    }

    /// Verify an access token's signature while accepting an expired `exp`
    pub fn decode_expired_access(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        let claims: Claims = decode(token, &self.decoding, &validation)?.claims;
        expect_kind(claims.kind, TokenKind::Access)?;
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}

fn expect_kind(actual: TokenKind, expected: TokenKind) -> Result<(), AuthError> {
    if actual != expected {
        return Err(AuthError::InvalidToken(format!("expected {:?} token", expected)));
    }
    Ok(())
}
