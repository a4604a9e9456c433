//! Client payload definitions
//!
//! Defines the payload structures exchanged in non-dispatch frames.

use collab_core::{ConnectionId, DocumentId};
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after the upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,

    /// Identifier the server assigned to this connection
    pub connection_id: ConnectionId,
}

impl HelloPayload {
    /// Create a Hello payload announcing the configured interval
    #[must_use]
    pub fn with_interval(connection_id: ConnectionId, heartbeat_interval: u64) -> Self {
        Self {
            heartbeat_interval,
            connection_id,
        }
    }
}

/// Payload for op 2 (Join Room) and op 3 (Leave Room)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomPayload {
    pub document_id: DocumentId,
}

/// Payload for op 4 (Push Content Change)
///
/// The content is relayed verbatim; it is neither validated nor merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChangePayload {
    pub document_id: DocumentId,
    pub content: String,
    pub cursor_position: i64,
}

/// Payload for op 5 (Push Cursor Position)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPositionPayload {
    pub document_id: DocumentId,
    pub position: i64,
}
