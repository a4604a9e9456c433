//! Bearer credential checks for the realtime handshake

use super::AuthError;
use collab_common::HubConfig;
use collab_core::{DomainError, Identity, RevocationList, TokenValidator};
use std::sync::Arc;

/// Credentials presented with an upgrade request
#[derive(Debug, Clone, Copy, Default)]
pub struct Handshake<'a> {
    /// Request path
    pub path: &'a str,
    /// Token from `Authorization: Bearer`
    pub bearer: Option<&'a str>,
    /// Token from the `access_token` query parameter
    pub access_token: Option<&'a str>,
}

/// Turns a handshake into the identity bound to the new connection
#[derive(Clone)]
pub struct Authenticator {
    validator: Arc<dyn TokenValidator>,
    revocations: Arc<dyn RevocationList>,
    hub_prefix: String,
    skip_revocation_on_hub: bool,
}

impl Authenticator {
    pub fn new(
        validator: Arc<dyn TokenValidator>,
        revocations: Arc<dyn RevocationList>,
        hub: &HubConfig,
    ) -> Self {
        Self {
            validator,
            revocations,
            hub_prefix: hub.path_prefix.trim_end_matches('/').to_string(),
            skip_revocation_on_hub: hub.skip_revocation_check,
        }
    }

    /// Check if a path lies below the realtime prefix, segment-wise
    #[must_use]
    pub fn is_hub_path(&self, path: &str) -> bool {
        path == self.hub_prefix
            || path
                .strip_prefix(self.hub_prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Validate the handshake credential
    ///
    /// The header wins over the query parameter, which is only honoured below
    /// the realtime prefix.
    pub async fn authenticate(&self, handshake: &Handshake<'_>) -> Result<Identity, AuthError> {
        let on_hub = self.is_hub_path(handshake.path);

        let token = handshake
            .bearer
            .or_else(|| handshake.access_token.filter(|_| on_hub))
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let identity = self.validator.validate(token).await?;

        if !(on_hub && self.skip_revocation_on_hub) && self.revocations.is_revoked(token).await? {
            return Err(DomainError::TokenRevoked.into());
        }

        Ok(identity)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("hub_prefix", &self.hub_prefix)
            .field("skip_revocation_on_hub", &self.skip_revocation_on_hub)
            .finish()
    }
}
