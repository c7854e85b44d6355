//! JWT token issuance and validation
//!
//! Access/refresh token pairs signed with HS256. The refresh token can only
//! be exchanged for a new access token, never used as a bearer credential.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes the two halves of a token pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Unique token identifier
    pub jti: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Access or refresh
    pub token_type: TokenType,
    /// Username of the authenticated account
    pub username: String,
    /// Email of the authenticated account
    pub email: String,
}

impl TokenClaims {
    /// User ID as UUID
    ///
    /// # Errors
    ///
    /// Fails when the subject claim is not a valid UUID.
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).context("Invalid user ID in token")
    }
}

/// An issued access/refresh pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token signing and validation service
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenService {
    pub fn new(
        secret: &str,
        issuer: impl Into<String>,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Issue an access/refresh pair for an authenticated user
    ///
    /// # Errors
    ///
    /// Fails when token encoding fails.
    pub fn issue_pair(&self, user_id: Uuid, username: &str, email: &str) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user_id, username, email, TokenType::Access)?,
            refresh: self.issue(user_id, username, email, TokenType::Refresh)?,
        })
    }

    /// Issue a single token of the given type
    ///
    /// # Errors
    ///
    /// Fails when token encoding fails.
    pub fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        email: &str,
        token_type: TokenType,
    ) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl_seconds,
            TokenType::Refresh => self.refresh_ttl_seconds,
        };
        let claims = TokenClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl,
            iss: self.issuer.clone(),
            token_type,
            username: username.to_string(),
            email: email.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to encode JWT")
    }

    /// Decode and validate a token of the expected type
    ///
    /// # Errors
    ///
    /// Fails on an invalid signature, expired token, wrong issuer, or a
    /// token of the other type.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .context("Invalid or expired token")?;
        if data.claims.token_type != expected {
            return Err(anyhow!("Wrong token type"));
        }
        Ok(data.claims)
    }

    /// Access-token TTL in seconds, exposed for `expires_in` responses
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", "hospital-api", 300, 86400)
    }

    #[test]
    fn pair_round_trips() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let pair = svc.issue_pair(user_id, "admin", "admin@hopital.fr").unwrap();

        let access = svc.decode(&pair.access, TokenType::Access).unwrap();
        assert_eq!(access.user_id().unwrap(), user_id);
        assert_eq!(access.username, "admin");
        assert_eq!(access.email, "admin@hopital.fr");

        let refresh = svc.decode(&pair.refresh, TokenType::Refresh).unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let svc = service();
        let pair = svc
            .issue_pair(Uuid::new_v4(), "admin", "admin@hopital.fr")
            .unwrap();
        assert!(svc.decode(&pair.refresh, TokenType::Access).is_err());
        assert!(svc.decode(&pair.access, TokenType::Refresh).is_err());
    }

    #[test]
    fn foreign_signature_rejected() {
        let svc = service();
        let other = TokenService::new("other-secret", "hospital-api", 300, 86400);
        let pair = svc
            .issue_pair(Uuid::new_v4(), "admin", "admin@hopital.fr")
            .unwrap();
        assert!(other.decode(&pair.access, TokenType::Access).is_err());
    }

    #[test]
    fn wrong_issuer_rejected() {
        let svc = service();
        let other = TokenService::new("test-secret", "someone-else", 300, 86400);
        let pair = svc
            .issue_pair(Uuid::new_v4(), "admin", "admin@hopital.fr")
            .unwrap();
        assert!(other.decode(&pair.access, TokenType::Access).is_err());
    }
}
