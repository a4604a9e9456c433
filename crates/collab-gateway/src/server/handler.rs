//! WebSocket handler
//!
//! Handles WebSocket connections and message processing.
//!
//! Each connection runs three tasks: a receive task that handles inbound frames
//! inline, a send task that drains the outbound queue into the socket, and a
//! heartbeat monitor. Whichever ends first ends the connection, after which the
//! disconnect reconciler cleans up room membership.

use crate::auth::HubIdentity;
use crate::connection::{Connection, Outbound};
use crate::handlers::MessageDispatcher;
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload, OpCode};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use collab_core::Identity;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

/// How long the writer gets to flush queued frames and the close frame
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Document collaboration handler
///
/// `HubIdentity` is extracted before `WebSocketUpgrade`, so an invalid
/// credential is refused with an HTTP error and no socket is ever opened.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    HubIdentity(identity): HubIdentity,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, identity, socket))
}

/// Which task ended the connection
enum Ended {
    Receive(Option<CloseCode>),
    Send,
    Timeout,
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, identity: Identity, socket: WebSocket) {
    let hub = state.config().hub.clone();

    // Create message channel for outgoing messages
    let (tx, mut rx) = mpsc::channel::<Outbound>(hub.outbound_buffer_size.max(1));

    // Register connection
    let connection = state.connection_manager().register(identity, tx);
    let connection_id = connection.id();

    tracing::info!(
        connection_id = %connection_id,
        user_id = %connection.identity().user_id,
        active_connections = state.connection_manager().connection_count(),
        "WebSocket connection established"
    );

    // Hello is always the first frame
    let hello = GatewayMessage::hello(HelloPayload::with_interval(
        connection_id,
        hub.heartbeat_interval_ms,
    ));
    if let Err(e) = connection.send(hello) {
        tracing::warn!(connection_id = %connection_id, error = %e, "Failed to queue Hello message");
        state.connection_manager().remove(connection_id);
        return;
    }

    // Split the WebSocket
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Spawn task to receive messages from WebSocket
    let state_recv = state.clone();
    let connection_recv = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            connection_recv.record_activity();

            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(close_code) =
                        handle_text_message(&state_recv, &connection_recv, &text)
                    {
                        tracing::debug!(
                            connection_id = %connection_recv.id(),
                            close_code = ?close_code,
                            "Closing connection due to error"
                        );
                        return Some(close_code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        connection_id = %connection_recv.id(),
                        "Binary messages not supported"
                    );
                    return Some(CloseCode::DecodeError);
                }
                Ok(Message::Ping(_)) => {
                    tracing::trace!(connection_id = %connection_recv.id(), "Ping received");
                    // Pong is handled automatically by axum
                }
                Ok(Message::Pong(_)) => {
                    tracing::trace!(connection_id = %connection_recv.id(), "Pong received");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %connection_recv.id(), "Client closed connection");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_recv.id(),
                        error = %e,
                        "WebSocket error"
                    );
                    return None;
                }
            }
        }
        None
    });

    // Spawn task to send messages to WebSocket
    let connection_send = connection.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            let message = match item {
                Outbound::Dispatch { event_type, data } => {
                    GatewayMessage::dispatch(event_type, connection_send.next_sequence(), data)
                }
                Outbound::Message(message) => message,
                Outbound::Close(code) => {
                    let frame = code.map(|code| CloseFrame {
                        code: code.as_u16(),
                        reason: code.description().into(),
                    });
                    let _ = ws_sink.send(Message::Close(frame)).await;
                    break;
                }
            };

            match message.to_json() {
                Ok(json) => {
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::warn!(
                            connection_id = %connection_send.id(),
                            "Failed to send message to WebSocket"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        connection_id = %connection_send.id(),
                        error = %e,
                        "Failed to encode outbound message"
                    );
                }
            }
        }

        let _ = ws_sink.close().await;
    });

    // Spawn heartbeat monitoring task
    let connection_hb = connection.clone();
    let heartbeat_timeout = Duration::from_millis(hub.heartbeat_timeout_ms);
    let check_every = Duration::from_millis((hub.heartbeat_interval_ms / 2).max(1));
    let mut heartbeat_task = tokio::spawn(async move {
        let mut check_interval = interval(check_every);

        loop {
            check_interval.tick().await;

            let time_since = connection_hb.time_since_activity();
            if time_since > heartbeat_timeout {
                tracing::warn!(
                    connection_id = %connection_hb.id(),
                    time_since_ms = time_since.as_millis(),
                    "Connection timed out (no heartbeat)"
                );
                break;
            }
        }
    });

    // Wait for any task to complete
    let ended = tokio::select! {
        result = &mut recv_task => Ended::Receive(result.ok().flatten()),
        _ = &mut send_task => Ended::Send,
        _ = &mut heartbeat_task => Ended::Timeout,
    };

    heartbeat_task.abort();
    if !matches!(ended, Ended::Receive(_)) {
        // No inbound frame may be handled once cleanup starts.
        recv_task.abort();
        let _ = recv_task.await;
    }

    let close_code = match ended {
        Ended::Receive(code) => code,
        Ended::Send => None,
        Ended::Timeout => Some(CloseCode::SessionTimeout),
    };

    cleanup_connection(&state, &connection);

    // Let the writer flush and send the close frame
    if !matches!(ended, Ended::Send) {
        if timeout(CLOSE_GRACE, connection.close(close_code)).await.is_err() {
            tracing::debug!(connection_id = %connection_id, "Close frame not queued in time");
        }
        if timeout(CLOSE_GRACE, &mut send_task).await.is_err() {
            send_task.abort();
        }
    }

    tracing::info!(
        connection_id = %connection_id,
        close_code = ?close_code,
        session_ms = connection.age().as_millis(),
        "WebSocket connection closed"
    );
}

/// Handle a text message from the client
fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    // Parse the message
    let message = match GatewayMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection.id(),
                error = %e,
                "Failed to parse message"
            );
            return Err(parse_failure_code(text));
        }
    };

    tracing::trace!(
        connection_id = %connection.id(),
        op = %message.op,
        "Received message"
    );

    // Dispatch to handler
    match MessageDispatcher::dispatch(state, connection, message) {
        Ok(Some(close_code)) => Err(close_code),
        Ok(None) => Ok(()),
        Err(e) => match e.to_close_code() {
            Some(close_code) => {
                tracing::warn!(
                    connection_id = %connection.id(),
                    error = %e,
                    "Handler error"
                );
                Err(close_code)
            }
            None => {
                tracing::debug!(connection_id = %connection.id(), error = %e, "Ignored");
                Ok(())
            }
        },
    }
}

/// An integer `op` outside the protocol is an opcode error, anything else a decode error
fn parse_failure_code(text: &str) -> CloseCode {
    let op = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("op").and_then(Value::as_u64));

    match op {
        Some(op) if u8::try_from(op).ok().and_then(OpCode::from_u8).is_none() => {
            CloseCode::UnknownOpcode
        }
        _ => CloseCode::DecodeError,
    }
}

/// Clean up a connection on disconnect
fn cleanup_connection(state: &GatewayState, connection: &Arc<Connection>) {
    let connection_id = connection.id();
    tracing::info!(connection_id = %connection_id, "Cleaning up connection");

    connection.terminate();

    let report = state.reconciler().reconcile(connection_id);
    tracing::debug!(
        connection_id = %connection_id,
        rooms_left = report.rooms_left.len(),
        notified = report.notified,
        "Membership reconciled"
    );

    // Remove from connection manager
    state.connection_manager().remove(connection_id);
    tracing::debug!(
        active_connections = state.connection_manager().connection_count(),
        "Connection released"
    );
}
