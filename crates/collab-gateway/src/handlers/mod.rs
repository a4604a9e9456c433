//! Op code handlers
//!
//! Handles incoming WebSocket messages based on their operation code.

mod error;
mod heartbeat;
mod relay;
mod rooms;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use relay::RelayHandler;
pub use rooms::RoomHandler;

use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use crate::server::GatewayState;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle an incoming client message
    ///
    /// Runs inline on the connection's receive task and never waits on other
    /// connections.
    pub fn dispatch(
        state: &GatewayState,
        connection: &Connection,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        // Validate that this is a client-sendable op code
        if !message.is_valid_client_message() {
            tracing::warn!(
                connection_id = %connection.id(),
                op = %message.op,
                "Received server-only op code from client"
            );
            return Ok(Some(CloseCode::UnknownOpcode));
        }

        match message.op {
            OpCode::Heartbeat => {
                let seq = message.as_heartbeat_seq().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Heartbeat payload".to_string())
                })?;

                HeartbeatHandler::handle(connection, seq)
            }
            OpCode::JoinRoom => {
                let payload = message.as_join_room().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid JoinRoom payload".to_string())
                })?;

                RoomHandler::join(state, connection, payload)
            }
            OpCode::LeaveRoom => {
                let payload = message.as_leave_room().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid LeaveRoom payload".to_string())
                })?;

                RoomHandler::leave(state, connection, payload)
            }
            OpCode::PushContentChange => {
                let payload = message.as_content_change().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid PushContentChange payload".to_string())
                })?;

                RelayHandler::content_change(state, connection, payload)
            }
            OpCode::PushCursorPosition => {
                let payload = message.as_cursor_position().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid PushCursorPosition payload".to_string())
                })?;

                RelayHandler::cursor_position(state, connection, payload)
            }
            // These ops should never reach here due to is_client_op check
            _ => {
                tracing::error!(op = %message.op, "Unhandled client op code");
                Ok(Some(CloseCode::UnknownOpcode))
            }
        }
    }
}
