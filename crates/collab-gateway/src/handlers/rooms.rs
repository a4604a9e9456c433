//! Room handlers (op 2 Join Room, op 3 Leave Room)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{CloseCode, RoomPayload};
use crate::server::GatewayState;

/// Handles room membership requests
pub struct RoomHandler;

impl RoomHandler {
    /// Join the document's room
    pub fn join(
        state: &GatewayState,
        connection: &Connection,
        payload: RoomPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        state
            .presence()
            .join(connection, &payload.document_id)
            .map(|_| None)
            .ok_or(HandlerError::StaleConnection)
    }

    /// Leave the document's room
    ///
    /// Leaving a room the connection is not in is accepted silently.
    pub fn leave(
        state: &GatewayState,
        connection: &Connection,
        payload: RoomPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        if connection.is_terminated() {
            return Err(HandlerError::StaleConnection);
        }

        if !state.presence().leave(connection, &payload.document_id) {
            tracing::debug!(
                connection_id = %connection.id(),
                document_id = %payload.document_id,
                "Leave for a room the connection is not in"
            );
        }

        Ok(None)
    }
}
