//! Gateway event types
//!
//! Defines all event type names for dispatch messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway event types
///
/// These are the event names sent in the `t` field of dispatch messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEventType {
    // Presence events
    /// Another connection joined the room
    ParticipantJoined,
    /// A connection left the room or disconnected
    ParticipantLeft,
    /// Snapshot of the other participants, sent to a joiner
    CurrentParticipants,

    // Relay events
    /// Editor content pushed by another participant
    ContentChanged,
    /// Caret moved by another participant
    CursorMoved,
}

impl GatewayEventType {
    /// Get the string representation of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParticipantJoined => "PARTICIPANT_JOINED",
            Self::ParticipantLeft => "PARTICIPANT_LEFT",
            Self::CurrentParticipants => "CURRENT_PARTICIPANTS",
            Self::ContentChanged => "CONTENT_CHANGED",
            Self::CursorMoved => "CURSOR_MOVED",
        }
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<GatewayEventType> for String {
    fn from(event: GatewayEventType) -> Self {
        event.as_str().to_string()
    }
}
