//! Presence broadcaster

use crate::broadcast::RoomBroadcaster;
use crate::connection::Connection;
use crate::events::{
    CurrentParticipantsEvent, ParticipantJoinedEvent, ParticipantLeftEvent, ParticipantPayload,
};
use crate::rooms::RoomRegistry;
use collab_core::{ConnectionId, DocumentId, Identity};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of a join request
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// `false` for a rejoin of an existing member
    pub newly_joined: bool,
    /// Number of members the join was announced to
    pub announced: usize,
    /// Snapshot sent to the joiner
    pub snapshot: CurrentParticipantsEvent,
}

/// Keeps room members informed of who else is in the room
#[derive(Debug, Clone)]
pub struct PresenceBroadcaster {
    registry: Arc<RoomRegistry>,
    broadcaster: RoomBroadcaster,
}

impl PresenceBroadcaster {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: RoomBroadcaster) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// Join a room, announce the joiner and send it the current participants
    ///
    /// A rejoin re-sends the snapshot without a second announcement. Returns
    /// `None` when the connection has already terminated.
    pub fn join(&self, connection: &Connection, document_id: &DocumentId) -> Option<JoinOutcome> {
        let connection_id = connection.id();
        if connection.is_terminated() {
            tracing::debug!(
                connection_id = %connection_id,
                document_id = %document_id,
                "Ignoring join from terminated connection"
            );
            return None;
        }

        let identity = connection.identity();
        let newly_joined = self.registry.join(connection_id, document_id, identity);

        // Termination raced the join: undo it so the reconciler's result stands.
        if connection.is_terminated() {
            if newly_joined {
                self.registry.leave(connection_id, document_id);
            }
            if self.registry.find_rooms_containing(connection_id).is_empty() {
                self.registry.remove_from_index(connection_id);
            }
            return None;
        }

        let announced = if newly_joined {
            let event = ParticipantJoinedEvent {
                document_id: document_id.clone(),
                participant: ParticipantPayload::new(identity, connection_id),
            };
            self.broadcaster.to_room(document_id, Some(connection_id), &event)
        } else {
            0
        };

        let snapshot = self.snapshot(connection_id, document_id);
        if let Err(e) = self.broadcaster.to_connection(connection_id, &snapshot) {
            tracing::warn!(
                connection_id = %connection_id,
                document_id = %document_id,
                error = %e,
                "Failed to send participant snapshot"
            );
        }

        tracing::info!(
            connection_id = %connection_id,
            user_id = %identity.user_id,
            document_id = %document_id,
            newly_joined,
            participants = snapshot.participants.len(),
            "Joined room"
        );

        Some(JoinOutcome {
            newly_joined,
            announced,
            snapshot,
        })
    }

    /// Leave a room and notify the remaining members
    ///
    /// Returns `false` if the connection was not a member or has terminated.
    pub fn leave(&self, connection: &Connection, document_id: &DocumentId) -> bool {
        if connection.is_terminated() {
            return false;
        }

        let connection_id = connection.id();
        if !self.registry.leave(connection_id, document_id) {
            return false;
        }

        self.announce_departure(document_id, connection_id, connection.identity());

        tracing::info!(
            connection_id = %connection_id,
            document_id = %document_id,
            "Left room"
        );

        true
    }

    /// Tell the remaining members that one connection left
    pub fn announce_departure(
        &self,
        document_id: &DocumentId,
        connection_id: ConnectionId,
        identity: &Identity,
    ) -> usize {
        let event = ParticipantLeftEvent {
            document_id: document_id.clone(),
            participant: ParticipantPayload::new(identity, connection_id),
        };
        self.broadcaster.to_room(document_id, Some(connection_id), &event)
    }

    /// Other participants of a room, one entry per user
    ///
    /// Each user is represented by their earliest-joined connection. Members
    /// whose identity can no longer be resolved are left out.
    pub fn snapshot(
        &self,
        requester: ConnectionId,
        document_id: &DocumentId,
    ) -> CurrentParticipantsEvent {
        let mut seen = HashSet::new();
        let participants = self
            .registry
            .members(document_id)
            .into_iter()
            .filter(|id| *id != requester)
            .filter_map(|id| self.registry.identity_of(id).map(|identity| (id, identity)))
            .filter(|(_, identity)| seen.insert(identity.user_id.clone()))
            .map(|(id, identity)| ParticipantPayload::new(&identity, id))
            .collect();

        CurrentParticipantsEvent {
            document_id: document_id.clone(),
            participants,
        }
    }
}
