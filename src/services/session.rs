//! Signed session tokens with an idle window and a remember-me bound

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Role;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "stockroom_session";

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Whether the cookie outlives the browser session
    pub remember: bool,
    /// Unix timestamp of the last authenticated request
    pub last_active: i64,
    pub iat: i64,
    /// Outer lifetime bound; the idle window usually expires first
    pub exp: i64,
}

/// Authenticated principal attached to requests
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub remember: bool,
}

/// Issues and validates session tokens
#[derive(Clone)]
pub struct SessionManager {
    secret: String,
    idle_timeout_minutes: i64,
    remember_days: i64,
}

impl SessionManager {
    pub fn new(secret: String, idle_timeout_minutes: i64, remember_days: i64) -> Self {
        Self {
            secret,
            idle_timeout_minutes,
            remember_days,
        }
    }

    /// Issue a fresh token for a just-authenticated user
    pub fn issue(&self, user_id: i64, username: &str, role: Role, remember: bool) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            remember,
            last_active: now,
            iat: now,
            exp: now + self.remember_days * 24 * 60 * 60,
        };
        self.encode(&claims)
    }

    /// Validate a token. A token whose last activity is older than the
    /// idle window is rejected; a live one comes back refreshed, with
    /// last_active moved to now.
    pub fn validate(&self, token: &str) -> AppResult<(SessionUser, String)> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::SessionExpired,
            _ => AppError::InvalidSession,
        })?;

        let claims = data.claims;
        let now = Utc::now().timestamp();
        if now - claims.last_active > self.idle_timeout_minutes * 60 {
            return Err(AppError::SessionExpired);
        }

        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::InvalidSession)?;

        let refreshed = self.encode(&SessionClaims {
            last_active: now,
            ..claims.clone()
        })?;

        let user = SessionUser {
            user_id,
            username: claims.username,
            role: claims.role,
            remember: claims.remember,
        };

        Ok((user, refreshed))
    }

    fn encode(&self, claims: &SessionClaims) -> AppResult<String> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }
}
