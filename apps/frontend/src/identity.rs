use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_state::AppState;

pub const IDENTITY_COOKIE: &str = "conference_identity";

/// Who is making the request, as asserted by the identity cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    Anonymous,
    Authenticated(String),
}

impl CallerIdentity {
    pub fn user_name(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(name) => Some(name),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct IdentityKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl IdentityKeys {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn mint(&self, user_name: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_name.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Returns the user name in a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Option<String> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) if !data.claims.sub.trim().is_empty() => Some(data.claims.sub),
            Ok(_) => None,
            Err(error) => {
                debug!(%error, "ignoring invalid identity cookie");
                None
            }
        }
    }

    pub fn identify(&self, headers: &HeaderMap) -> CallerIdentity {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == IDENTITY_COOKIE)
            .and_then(|cookie| self.verify(cookie.value()))
            .map_or(CallerIdentity::Anonymous, CallerIdentity::Authenticated)
    }
}

/// Browser-session cookie; the token's own `exp` bounds its lifetime.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((IDENTITY_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn cleared_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookie
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CallerIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(state.identity.identify(&parts.headers))
    }
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
