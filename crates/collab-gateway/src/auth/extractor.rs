//! Handshake extractor
//!
//! Runs before `WebSocketUpgrade`, so a rejected credential answers the upgrade
//! request with an HTTP error instead of a WebSocket.

use super::{AuthError, Handshake};
use crate::server::GatewayState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use collab_core::Identity;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct HandshakeQuery {
    access_token: Option<String>,
}

/// Identity of an authenticated realtime handshake
#[derive(Debug, Clone)]
pub struct HubIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for HubIdentity
where
    S: Send + Sync,
    GatewayState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer);

        let query = Query::<HandshakeQuery>::try_from_uri(&parts.uri)
            .map(|Query(query)| query)
            .unwrap_or_default();

        let handshake = Handshake {
            path: parts.uri.path(),
            bearer: bearer.as_ref().map(Bearer::token),
            access_token: query.access_token.as_deref(),
        };

        let gateway_state = GatewayState::from_ref(state);
        let identity = gateway_state
            .authenticator()
            .authenticate(&handshake)
            .await
            .map_err(|e| {
                tracing::warn!(
                    path = %parts.uri.path(),
                    code = e.error_code(),
                    "Handshake rejected"
                );
                e
            })?;

        Ok(HubIdentity(identity))
    }
}
