//! services/api/src/web/token.rs
//!
//! HS256 session tokens and the cookie that carries them.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "token";
pub const SESSION_TTL_SECS: i64 = 3600;

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user's id.
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::seconds(SESSION_TTL_SECS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Checks signature and expiry. No leeway: an expired token is rejected.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

/// Builds the `Set-Cookie` value for a fresh session.
pub fn session_cookie(token: &str, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        if secure { " Secure;" } else { "" },
        SESSION_TTL_SECS
    )
}

pub fn clear_session_cookie(secure: bool) -> String {
    format!(
        "{}=; HttpOnly;{} SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE,
        if secure { " Secure;" } else { "" },
    )
}

/// Pulls the session token out of a `Cookie` header value.
pub fn token_from_cookie_header(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|c| {
        c.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|value| !value.is_empty())
    })
}
