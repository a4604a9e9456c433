//! Credential ports
//!
//! Issuance and revocation of credentials live outside the coordinator. The gateway
//! only needs to turn a presented bearer token into an [`Identity`] and, where
//! configured, ask whether that token has been revoked.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::value_objects::Identity;

/// Validates a bearer credential (signature, expiry, issuer, audience)
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate the raw token and return the identity it carries
    async fn validate(&self, token: &str) -> Result<Identity, DomainError>;
}

/// Revocation list (token blacklist) maintained by the credential issuer
#[async_trait]
pub trait RevocationList: Send + Sync {
    /// Check whether the raw token has been revoked
    async fn is_revoked(&self, token: &str) -> Result<bool, DomainError>;
}
