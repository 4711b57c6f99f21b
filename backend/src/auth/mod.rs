use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// HS256 secret bearer tokens are signed with. Pulled from router state.
#[derive(Clone)]
pub struct JwtSecret(Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("JWT validation failed: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("invalid user ID in token")]
    InvalidSubject,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        warn!(error = %err, "auth: request rejected");
        AppError::Unauthorized
    }
}

pub fn validate_access_token(token: &str, secret: &JwtSecret) -> Result<AccessClaims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_str().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<AccessClaims>(token, &decoding_key, &validation)?;

    Ok(token_data.claims)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    JwtSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthError::MissingToken)?;

        let secret = JwtSecret::from_ref(state);
        let claims = validate_access_token(bearer.token(), &secret)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidSubject)?;

        Ok(AuthUser { user_id })
    }
}

#[cfg(test)]
mod tests;
