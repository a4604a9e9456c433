//! Heartbeat handler (op 1)

use super::{HandlerError, HandlerResult};
use crate::connection::{Connection, DeliveryError};
use crate::protocol::{CloseCode, GatewayMessage};

/// Handles heartbeat messages
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Handle a heartbeat from the client
    ///
    /// The `last_sequence` is the client's last received sequence number (or None if none received).
    pub fn handle(
        connection: &Connection,
        last_sequence: Option<u64>,
    ) -> HandlerResult<Option<CloseCode>> {
        connection.record_activity();

        tracing::trace!(
            connection_id = %connection.id(),
            client_seq = ?last_sequence,
            server_seq = connection.current_sequence(),
            "Heartbeat received"
        );

        match connection.send(GatewayMessage::heartbeat_ack()) {
            Ok(()) => Ok(None),
            // A busy client still proved it is alive.
            Err(DeliveryError::QueueFull(_)) => {
                tracing::debug!(connection_id = %connection.id(), "Heartbeat ACK dropped");
                Ok(None)
            }
            Err(e) => Err(HandlerError::Internal(format!("Failed to send heartbeat ACK: {e}"))),
        }
    }
}
