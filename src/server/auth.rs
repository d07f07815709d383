//! Bearer token validation (HS256 JWTs carrying a shared `secret` claim).

use axum::http::{header, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub exp: u64,
}

pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
    api_secret: String,
}

impl TokenValidator {
    pub fn new(jwt_secret: &str, api_secret: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            api_secret: api_secret.into(),
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Invalid,
        })?;
        match data.claims.secret.as_deref() {
            Some(secret) if secret == self.api_secret => Ok(data.claims),
            _ => Err(AuthError::Invalid),
        }
    }

    /// Validates the `Authorization: Bearer <token>` header.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::Invalid)?;
        self.validate(token)
    }
}
