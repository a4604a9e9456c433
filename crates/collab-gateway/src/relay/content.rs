//! Content relay
//!
//! Relays are not merged, validated or reordered. The authoritative document lives
//! in the external store; a relayed event only tells other editors what changed.

use crate::broadcast::RoomBroadcaster;
use crate::connection::Connection;
use crate::events::{ContentChangedEvent, CursorMovedEvent};
use crate::protocol::{ContentChangePayload, CursorPositionPayload};
use crate::rooms::RoomRegistry;
use chrono::Utc;
use collab_core::{DocumentId, Identity};
use std::sync::Arc;

/// Fans content and cursor updates out to the other members of a room
#[derive(Debug, Clone)]
pub struct ContentRelay {
    registry: Arc<RoomRegistry>,
    broadcaster: RoomBroadcaster,
}

impl ContentRelay {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: RoomBroadcaster) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// Relay the sender's content to every other member
    ///
    /// Returns the number of recipients, or `None` if the push was dropped.
    pub fn push_content_change(
        &self,
        sender: &Connection,
        payload: ContentChangePayload,
    ) -> Option<usize> {
        let identity = self.sender_identity(sender, &payload.document_id)?;

        let event = ContentChangedEvent {
            document_id: payload.document_id,
            content: payload.content,
            cursor_position: payload.cursor_position,
            user_id: identity.user_id,
            display_name: identity.display_name,
            server_timestamp: Utc::now(),
        };

        Some(
            self.broadcaster
                .to_room(&event.document_id, Some(sender.id()), &event),
        )
    }

    /// Relay the sender's caret position to every other member
    pub fn push_cursor_position(
        &self,
        sender: &Connection,
        payload: CursorPositionPayload,
    ) -> Option<usize> {
        let identity = self.sender_identity(sender, &payload.document_id)?;

        let event = CursorMovedEvent {
            document_id: payload.document_id,
            user_id: identity.user_id,
            display_name: identity.display_name,
            position: payload.position,
        };

        Some(
            self.broadcaster
                .to_room(&event.document_id, Some(sender.id()), &event),
        )
    }

    /// Identity to attach to a relayed event, if the sender may push to the room
    fn sender_identity(&self, sender: &Connection, document_id: &DocumentId) -> Option<Identity> {
        if sender.is_terminated() {
            return None;
        }

        if !self.registry.is_member(sender.id(), document_id) {
            tracing::debug!(
                connection_id = %sender.id(),
                document_id = %document_id,
                "Dropping push from non-member"
            );
            return None;
        }

        self.registry.identity_of(sender.id())
    }
}
