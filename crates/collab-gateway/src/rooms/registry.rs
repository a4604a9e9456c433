//! Room registry
//!
//! Maps each document to the connections collaborating on it. Rooms are created on
//! first join and removed on last leave, inside the same shard lock, so an empty
//! room is never observable. A reverse index maps each joined connection to the
//! identity it was bound to at handshake.
//!
//! No method holds a guard of one map while touching the other.

use collab_core::{ConnectionId, DocumentId, Identity};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::hash_map;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Room {
    /// Member connection -> join ordinal
    members: HashMap<ConnectionId, u64>,
}

/// Concurrency-safe registry of document rooms
pub struct RoomRegistry {
    rooms: DashMap<DocumentId, Room>,
    index: DashMap<ConnectionId, Identity>,
    join_counter: AtomicU64,
}

impl RoomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            index: DashMap::new(),
            join_counter: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a connection to a room, creating the room if needed
    ///
    /// Idempotent: a rejoin keeps the original join position but refreshes the
    /// index entry. Returns `true` if the membership is new.
    pub fn join(
        &self,
        connection_id: ConnectionId,
        document_id: &DocumentId,
        identity: &Identity,
    ) -> bool {
        // Index first so every member is resolvable.
        self.index.insert(connection_id, identity.clone());

        let ordinal = self.join_counter.fetch_add(1, Ordering::Relaxed);
        let mut room = self.rooms.entry(document_id.clone()).or_default();
        match room.members.entry(connection_id) {
            hash_map::Entry::Vacant(slot) => {
                slot.insert(ordinal);
                true
            }
            hash_map::Entry::Occupied(_) => false,
        }
    }

    /// Remove a connection from a room, deleting the room once empty
    ///
    /// Returns `false` if the connection was not a member.
    pub fn leave(&self, connection_id: ConnectionId, document_id: &DocumentId) -> bool {
        match self.rooms.entry(document_id.clone()) {
            Entry::Occupied(mut entry) => {
                let removed = entry.get_mut().members.remove(&connection_id).is_some();
                if entry.get().members.is_empty() {
                    entry.remove();
                }
                removed
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Every room the connection is currently a member of
    pub fn find_rooms_containing(&self, connection_id: ConnectionId) -> Vec<DocumentId> {
        self.rooms
            .iter()
            .filter(|room| room.members.contains_key(&connection_id))
            .map(|room| room.key().clone())
            .collect()
    }

    /// Drop the index entry of a connection
    pub fn remove_from_index(&self, connection_id: ConnectionId) -> Option<Identity> {
        self.index.remove(&connection_id).map(|(_, identity)| identity)
    }

    /// Identity a joined connection was bound to
    pub fn identity_of(&self, connection_id: ConnectionId) -> Option<Identity> {
        self.index.get(&connection_id).map(|r| r.clone())
    }

    /// Members of a room, earliest joiner first
    pub fn members(&self, document_id: &DocumentId) -> Vec<ConnectionId> {
        let mut members: Vec<(ConnectionId, u64)> = self
            .rooms
            .get(document_id)
            .map(|room| room.members.iter().map(|(id, ord)| (*id, *ord)).collect())
            .unwrap_or_default();

        members.sort_by_key(|(_, ordinal)| *ordinal);
        members.into_iter().map(|(id, _)| id).collect()
    }

    pub fn is_member(&self, connection_id: ConnectionId, document_id: &DocumentId) -> bool {
        self.rooms
            .get(document_id)
            .is_some_and(|room| room.members.contains_key(&connection_id))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, document_id: &DocumentId) -> bool {
        self.rooms.contains_key(document_id)
    }

    pub fn indexed_count(&self) -> usize {
        self.index.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .field("indexed", &self.index.len())
            .finish()
    }
}
