//! JWT utilities for authentication
//!
//! Validates HS256 bearer tokens issued by the account service (signature, expiry,
//! issuer, audience) using the `jsonwebtoken` crate. Token minting is kept for local
//! tooling and tests; the coordinator itself never issues credentials.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use collab_core::{DomainError, Identity, TokenValidator, UserId};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Human readable name shown to other participants
    #[serde(rename = "displayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Claims {
    /// Build the identity carried by these claims
    ///
    /// # Errors
    /// Returns an error if the subject is empty
    pub fn identity(&self) -> Result<Identity, AppError> {
        if self.sub.trim().is_empty() {
            return Err(AppError::InvalidToken);
        }

        Ok(Identity {
            user_id: UserId::new(self.sub.clone()),
            display_name: self.display_name.clone(),
        })
    }
}

/// JWT service for validating (and, in tooling, minting) bearer tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiration_hours: i64,
    validation: Validation,
}

impl JwtService {
    /// Create a new JWT service
    #[must_use]
    pub fn new(secret: &str, issuer: &str, audience: &str, expiration_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            expiration_hours,
            validation,
        }
    }

    /// Create a JWT service from configuration
    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            &config.secret,
            &config.issuer,
            &config.audience,
            config.expiration_hours,
        )
    }

    /// Issue a token for an identity with the configured lifetime
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_token(&self, identity: &Identity) -> Result<String, AppError> {
        let expires_at = Utc::now() + Duration::hours(self.expiration_hours);
        self.issue_token_until(identity, expires_at)
    }

    /// Issue a token for an identity that expires at the given instant
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_token_until(
        &self,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: identity.user_id.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            display_name: identity.display_name.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to encode JWT")))
    }

    /// Decode and validate a JWT token
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired, or issued for another audience
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                    _ => AppError::InvalidToken,
                }
            })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl TokenValidator for JwtService {
    async fn validate(&self, token: &str) -> Result<Identity, DomainError> {
        let to_domain = |e: AppError| match e {
            AppError::TokenExpired => DomainError::TokenExpired,
            _ => DomainError::InvalidToken,
        };

        self.decode_token(token)
            .map_err(to_domain)?
            .identity()
            .map_err(to_domain)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_hours", &self.expiration_hours)
            .finish_non_exhaustive()
    }
}
