//! Relay handlers (op 4 Push Content Change, op 5 Push Cursor Position)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{CloseCode, ContentChangePayload, CursorPositionPayload};
use crate::server::GatewayState;

/// Handles content and cursor pushes
pub struct RelayHandler;

impl RelayHandler {
    pub fn content_change(
        state: &GatewayState,
        connection: &Connection,
        payload: ContentChangePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        if connection.is_terminated() {
            return Err(HandlerError::StaleConnection);
        }

        let sent = state.relay().push_content_change(connection, payload);
        tracing::trace!(connection_id = %connection.id(), sent = ?sent, "Content change relayed");

        Ok(None)
    }

    pub fn cursor_position(
        state: &GatewayState,
        connection: &Connection,
        payload: CursorPositionPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        if connection.is_terminated() {
            return Err(HandlerError::StaleConnection);
        }

        state.relay().push_cursor_position(connection, payload);

        Ok(None)
    }
}
