//! In-process revocation list
//!
//! Stands in for the issuer's token blacklist when the gateway runs standalone.

use async_trait::async_trait;
use collab_core::{DomainError, RevocationList};
use dashmap::DashSet;

/// Revocation list backed by a concurrent set of raw tokens
#[derive(Debug, Default)]
pub struct InMemoryRevocationList {
    tokens: DashSet<String>,
}

impl InMemoryRevocationList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a token; returns false if it was already revoked
    pub fn revoke(&self, token: impl Into<String>) -> bool {
        self.tokens.insert(token.into())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl RevocationList for InMemoryRevocationList {
    async fn is_revoked(&self, token: &str) -> Result<bool, DomainError> {
        Ok(self.tokens.contains(token))
    }
}
