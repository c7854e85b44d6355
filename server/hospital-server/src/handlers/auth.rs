//! Token obtain/refresh endpoints
//!
//! The only unauthenticated endpoints: exchange username/password for an
//! access/refresh pair, or a valid refresh token for a new access token.

use crate::auth::TokenType;
use crate::error::ApiError;
use crate::server::HospitalServer;
use crate::validation::RequestValidation;
use crate::validate_required;
use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

/// Account row used for credential verification
#[derive(Debug, FromRow)]
struct UserAccount {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
}

/// Token obtain request
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenObtainRequest {
    #[schema(example = "admin")]
    pub username: String,
    pub password: String,
}

impl RequestValidation for TokenObtainRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.username, "Username is required");
        validate_required!(self.password, "Password is required");
        Ok(())
    }
}

/// Issued token pair
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPairResponse {
    /// JWT access token
    pub access: String,
    /// JWT refresh token
    pub refresh: String,
}

/// Token refresh request
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRefreshRequest {
    pub refresh: String,
}

/// Refreshed access token
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenRefreshResponse {
    pub access: String,
}

/// Exchange username/password for an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/token/",
    request_body = TokenObtainRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPairResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Bad credentials")
    ),
    tag = "auth"
)]
pub async fn obtain_token(
    State(server): State<HospitalServer>,
    Json(req): Json<TokenObtainRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    req.validate()?;

    let account = sqlx::query_as::<_, UserAccount>(
        "SELECT id, username, email, password_hash FROM utilisateurs
         WHERE username = $1 AND is_active = true",
    )
    .bind(&req.username)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    let parsed_hash = PasswordHash::new(&account.password_hash)
        .map_err(|_| ApiError::internal("Corrupt password hash"))?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let pair = server
        .tokens
        .issue_pair(account.id, &account.username, &account.email)
        .map_err(|err| {
            tracing::error!(error = %err, "token issuance failed");
            ApiError::internal("Token issuance failed")
        })?;

    tracing::info!(username = %account.username, "token pair issued");

    Ok(Json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/token/refresh/",
    request_body = TokenRefreshRequest,
    responses(
        (status = 200, description = "Access token refreshed", body = TokenRefreshResponse),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(server): State<HospitalServer>,
    Json(req): Json<TokenRefreshRequest>,
) -> Result<Json<TokenRefreshResponse>, ApiError> {
    let claims = server
        .tokens
        .decode(&req.refresh, TokenType::Refresh)
        .map_err(|_| ApiError::unauthorized("Token is invalid or expired"))?;

    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::unauthorized("Token is invalid or expired"))?;

    let access = server
        .tokens
        .issue(user_id, &claims.username, &claims.email, TokenType::Access)
        .map_err(|err| {
            tracing::error!(error = %err, "token issuance failed");
            ApiError::internal("Token issuance failed")
        })?;

    Ok(Json(TokenRefreshResponse { access }))
}
