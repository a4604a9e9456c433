//! Gateway state
//!
//! Application state for the gateway server.

use crate::auth::Authenticator;
use crate::broadcast::RoomBroadcaster;
use crate::connection::ConnectionManager;
use crate::presence::PresenceBroadcaster;
use crate::reconcile::DisconnectReconciler;
use crate::relay::ContentRelay;
use crate::rooms::RoomRegistry;
use collab_common::AppConfig;
use collab_core::{RevocationList, TokenValidator};
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared services for the gateway server. Every connection task works
/// against the same instances.
#[derive(Clone)]
pub struct GatewayState {
    /// Application configuration
    config: Arc<AppConfig>,
    /// Live WebSocket connections
    connection_manager: Arc<ConnectionManager>,
    /// Document rooms and the connection index
    registry: Arc<RoomRegistry>,
    /// Join/leave announcements
    presence: Arc<PresenceBroadcaster>,
    /// Content and cursor fan-out
    relay: Arc<ContentRelay>,
    /// Post-disconnect cleanup
    reconciler: Arc<DisconnectReconciler>,
    /// Handshake credential checks
    authenticator: Arc<Authenticator>,
}

impl GatewayState {
    /// Wire up the gateway services
    pub fn new(
        config: AppConfig,
        validator: Arc<dyn TokenValidator>,
        revocations: Arc<dyn RevocationList>,
    ) -> Self {
        let connection_manager = ConnectionManager::new_shared();
        let registry = RoomRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new(registry.clone(), connection_manager.clone());

        let presence = Arc::new(PresenceBroadcaster::new(
            registry.clone(),
            broadcaster.clone(),
        ));
        let relay = Arc::new(ContentRelay::new(registry.clone(), broadcaster));
        let reconciler = Arc::new(DisconnectReconciler::new(registry.clone(), presence.clone()));
        let authenticator = Arc::new(Authenticator::new(validator, revocations, &config.hub));

        Self {
            config: Arc::new(config),
            connection_manager,
            registry,
            presence,
            relay,
            reconciler,
            authenticator,
        }
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &Arc<ConnectionManager> {
        &self.connection_manager
    }

    /// Get the room registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Get the presence broadcaster
    pub fn presence(&self) -> &Arc<PresenceBroadcaster> {
        &self.presence
    }

    /// Get the content relay
    pub fn relay(&self) -> &Arc<ContentRelay> {
        &self.relay
    }

    /// Get the disconnect reconciler
    pub fn reconciler(&self) -> &Arc<DisconnectReconciler> {
        &self.reconciler
    }

    /// Get the handshake authenticator
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("registry", &self.registry)
            .field("config", &"AppConfig")
            .finish()
    }
}
