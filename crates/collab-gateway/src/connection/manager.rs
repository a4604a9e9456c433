//! Connection manager
//!
//! Manages all active WebSocket connections using DashMap for thread-safe access.

use super::{Connection, Outbound};
use collab_core::{ConnectionId, Identity};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
///
/// Uses `DashMap` for concurrent access to connection state.
pub struct ConnectionManager {
    /// Active connections by connection ID
    connections: DashMap<ConnectionId, Arc<Connection>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a newly authenticated connection
    pub fn register(&self, identity: Identity, sender: mpsc::Sender<Outbound>) -> Arc<Connection> {
        let connection = Connection::new(identity, sender);
        let id = connection.id();

        self.connections.insert(id, connection.clone());

        tracing::debug!(
            connection_id = %id,
            user_id = %connection.identity().user_id,
            "Connection registered"
        );

        connection
    }

    /// Remove a connection
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let (_, connection) = self.connections.remove(&id)?;

        tracing::debug!(connection_id = %id, "Connection removed");

        Some(connection)
    }

    /// Get a connection by ID
    pub fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(&id).map(|r| r.clone())
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .finish()
    }
}
