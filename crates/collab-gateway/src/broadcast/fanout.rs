//! Room fan-out
//!
//! Snapshots a room's member list, releases the registry, then hands the event to
//! each recipient's bounded queue without waiting. A slow or vanished recipient
//! only loses its own copy.

use crate::connection::{ConnectionManager, DeliveryError};
use crate::events::DispatchEvent;
use crate::rooms::RoomRegistry;
use collab_core::{ConnectionId, DocumentId};
use std::sync::Arc;

/// Fans dispatch events out to room members
#[derive(Debug, Clone)]
pub struct RoomBroadcaster {
    registry: Arc<RoomRegistry>,
    connections: Arc<ConnectionManager>,
}

impl RoomBroadcaster {
    pub fn new(registry: Arc<RoomRegistry>, connections: Arc<ConnectionManager>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    /// Send an event to every member of a room except `exclude`
    ///
    /// Returns the number of recipients the event was queued for.
    pub fn to_room<E: DispatchEvent>(
        &self,
        document_id: &DocumentId,
        exclude: Option<ConnectionId>,
        event: &E,
    ) -> usize {
        let data = match serde_json::to_value(event) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(
                    document_id = %document_id,
                    event = %E::EVENT_TYPE,
                    error = %e,
                    "Failed to encode event"
                );
                return 0;
            }
        };

        let recipients = self.registry.members(document_id);
        let mut sent = 0;

        for recipient in recipients {
            if Some(recipient) == exclude {
                continue;
            }

            let result = match self.connections.get(recipient) {
                Some(connection) => connection.deliver(E::EVENT_TYPE, data.clone()),
                None => Err(DeliveryError::RecipientGone(recipient)),
            };

            match result {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!(
                    document_id = %document_id,
                    event = %E::EVENT_TYPE,
                    error = %e,
                    "Dropped event for recipient"
                ),
            }
        }

        tracing::trace!(
            document_id = %document_id,
            event = %E::EVENT_TYPE,
            sent = sent,
            "Event sent to room"
        );

        sent
    }

    /// Send an event to a single connection
    ///
    /// # Errors
    /// Fails if the connection is gone or cannot take the event right now.
    pub fn to_connection<E: DispatchEvent>(
        &self,
        connection_id: ConnectionId,
        event: &E,
    ) -> Result<(), DeliveryError> {
        let connection = self
            .connections
            .get(connection_id)
            .ok_or(DeliveryError::RecipientGone(connection_id))?;

        // An event that cannot be encoded is treated like an undeliverable one.
        let data = serde_json::to_value(event).map_err(|e| {
            tracing::error!(event = %E::EVENT_TYPE, error = %e, "Failed to encode event");
            DeliveryError::Closed(connection_id)
        })?;

        connection.deliver(E::EVENT_TYPE, data)
    }
}
