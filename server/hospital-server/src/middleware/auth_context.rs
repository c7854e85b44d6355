//! Authentication context extraction
//!
//! `AuthContext` is an axum extractor that validates the bearer token and
//! exposes the authenticated account to handlers. Adding it to a handler's
//! signature is what makes the endpoint require authentication.

use crate::auth::TokenType;
use crate::error::ApiError;
use crate::server::HospitalServer;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use uuid::Uuid;

/// Authenticated account extracted from the Authorization header
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    HospitalServer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let server = HospitalServer::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::unauthorized("Authentication credentials were not provided")
            })?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header"))?;

        let claims = server
            .tokens
            .decode(token, TokenType::Access)
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::unauthorized("Invalid token subject"))?;

        Ok(Self {
            user_id,
            username: claims.username,
            email: claims.email,
        })
    }
}
