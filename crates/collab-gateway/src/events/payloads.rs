//! Event payload definitions
//!
//! Defines the data structures for each gateway event type.

use super::GatewayEventType;
use chrono::{DateTime, Utc};
use collab_core::{ConnectionId, DocumentId, Identity, UserId};
use serde::{Deserialize, Serialize};

/// An event body that can be sent as a Dispatch (op=0) frame
pub trait DispatchEvent: Serialize {
    /// Name carried in the `t` field
    const EVENT_TYPE: GatewayEventType;
}

// === Presence Events ===

/// One connection of a participant
///
/// `display_name` is always present on the wire, `null` when the credential
/// carried none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPayload {
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    pub connection_id: ConnectionId,
}

impl ParticipantPayload {
    #[must_use]
    pub fn new(identity: &Identity, connection_id: ConnectionId) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            display_name: identity.display_name.clone(),
            connection_id,
        }
    }
}

/// `PARTICIPANT_JOINED` event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantJoinedEvent {
    pub document_id: DocumentId,
    #[serde(flatten)]
    pub participant: ParticipantPayload,
}

impl DispatchEvent for ParticipantJoinedEvent {
    const EVENT_TYPE: GatewayEventType = GatewayEventType::ParticipantJoined;
}

/// `PARTICIPANT_LEFT` event payload
///
/// Scoped to a single connection; the same user may still be present through
/// another connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantLeftEvent {
    pub document_id: DocumentId,
    #[serde(flatten)]
    pub participant: ParticipantPayload,
}

impl DispatchEvent for ParticipantLeftEvent {
    const EVENT_TYPE: GatewayEventType = GatewayEventType::ParticipantLeft;
}

/// `CURRENT_PARTICIPANTS` event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentParticipantsEvent {
    pub document_id: DocumentId,
    pub participants: Vec<ParticipantPayload>,
}

impl DispatchEvent for CurrentParticipantsEvent {
    const EVENT_TYPE: GatewayEventType = GatewayEventType::CurrentParticipants;
}

// === Relay Events ===

/// `CONTENT_CHANGED` event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChangedEvent {
    pub document_id: DocumentId,
    pub content: String,
    pub cursor_position: i64,
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Serialized as RFC 3339
    pub server_timestamp: DateTime<Utc>,
}

impl DispatchEvent for ContentChangedEvent {
    const EVENT_TYPE: GatewayEventType = GatewayEventType::ContentChanged;
}

/// `CURSOR_MOVED` event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorMovedEvent {
    pub document_id: DocumentId,
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    pub position: i64,
}

impl DispatchEvent for CursorMovedEvent {
    const EVENT_TYPE: GatewayEventType = GatewayEventType::CursorMoved;
}
