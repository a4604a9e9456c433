//! Disconnect reconciler
//!
//! Runs once the transport of a connection has ended, whatever the cause (client
//! close, heartbeat timeout, socket error, writer gone). For each room still
//! containing the connection it removes the membership and, when the identity is
//! still resolvable, tells the remaining members. The index entry goes last.
//!
//! Running it twice for the same connection is harmless: the second run finds no
//! rooms and notifies nobody.

use crate::presence::PresenceBroadcaster;
use crate::rooms::RoomRegistry;
use collab_core::{ConnectionId, DocumentId};
use std::sync::Arc;

/// What a reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Rooms the connection was removed from
    pub rooms_left: Vec<DocumentId>,
    /// Number of leave notifications queued
    pub notified: usize,
}

/// Removes a terminated connection from every room it was in
#[derive(Debug, Clone)]
pub struct DisconnectReconciler {
    registry: Arc<RoomRegistry>,
    presence: Arc<PresenceBroadcaster>,
}

impl DisconnectReconciler {
    pub fn new(registry: Arc<RoomRegistry>, presence: Arc<PresenceBroadcaster>) -> Self {
        Self { registry, presence }
    }

    pub fn reconcile(&self, connection_id: ConnectionId) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for document_id in self.registry.find_rooms_containing(connection_id) {
            let identity = self.registry.identity_of(connection_id);

            if !self.registry.leave(connection_id, &document_id) {
                // Someone else already removed it.
                continue;
            }

            match identity {
                Some(identity) => {
                    report.notified +=
                        self.presence
                            .announce_departure(&document_id, connection_id, &identity);
                }
                None => tracing::debug!(
                    connection_id = %connection_id,
                    document_id = %document_id,
                    "Identity already evicted, skipping leave notification"
                ),
            }

            report.rooms_left.push(document_id);
        }

        self.registry.remove_from_index(connection_id);

        if !report.rooms_left.is_empty() {
            tracing::info!(
                connection_id = %connection_id,
                rooms = report.rooms_left.len(),
                notified = report.notified,
                "Reconciled disconnected connection"
            );
        }

        report
    }
}
