//! Individual WebSocket connection
//!
//! Represents a single authenticated WebSocket connection and its state.

use crate::events::GatewayEventType;
use crate::protocol::{CloseCode, GatewayMessage};
use collab_core::{ConnectionId, Identity};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;

/// Connection state
///
/// A connection only exists once the handshake succeeded, so it starts `Bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Authenticated and able to join rooms
    Bound,
    /// Transport ended; absorbing
    Terminated,
}

/// Item queued for the socket writer
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Dispatch event; the writer stamps the sequence number
    Dispatch {
        event_type: GatewayEventType,
        data: Value,
    },
    /// Any other frame, written as is
    Message(GatewayMessage),
    /// Close the socket, optionally with a gateway close code
    Close(Option<CloseCode>),
}

/// Failure to hand an event to a single recipient
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Recipient {0} is no longer connected")]
    RecipientGone(ConnectionId),

    #[error("Outbound queue of {0} is full")]
    QueueFull(ConnectionId),

    #[error("Outbound queue of {0} is closed")]
    Closed(ConnectionId),
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection ID
    id: ConnectionId,

    /// Identity bound at handshake
    identity: Identity,

    /// Current connection state
    state: RwLock<ConnectionState>,

    /// Bounded queue drained by the socket writer
    sender: mpsc::Sender<Outbound>,

    /// Last dispatch sequence number written
    sequence: AtomicU64,

    /// Last inbound frame of any kind
    last_activity: Mutex<Instant>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new bound connection
    pub fn new(identity: Identity, sender: mpsc::Sender<Outbound>) -> Arc<Self> {
        Self::with_id(ConnectionId::generate(), identity, sender)
    }

    /// Create a bound connection with a known ID
    pub fn with_id(
        id: ConnectionId,
        identity: Identity,
        sender: mpsc::Sender<Outbound>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            identity,
            state: RwLock::new(ConnectionState::Bound),
            sender,
            sequence: AtomicU64::new(0),
            last_activity: Mutex::new(Instant::now()),
            created_at: Instant::now(),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the bound identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check if the transport has ended
    pub fn is_terminated(&self) -> bool {
        self.state() == ConnectionState::Terminated
    }

    /// Move to `Terminated`
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn terminate(&self) -> bool {
        let mut state = self.state.write();
        if *state == ConnectionState::Terminated {
            return false;
        }
        *state = ConnectionState::Terminated;
        true
    }

    /// Get the next sequence number
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get the current sequence number
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Record an inbound frame
    pub fn record_activity(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Get time since the last inbound frame
    pub fn time_since_activity(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Queue a dispatch event without waiting
    ///
    /// # Errors
    /// Fails when the queue is full or the writer has gone away.
    pub fn deliver(&self, event_type: GatewayEventType, data: Value) -> Result<(), DeliveryError> {
        self.try_enqueue(Outbound::Dispatch { event_type, data })
    }

    /// Queue a non-dispatch frame without waiting
    ///
    /// # Errors
    /// Fails when the queue is full or the writer has gone away.
    pub fn send(&self, message: GatewayMessage) -> Result<(), DeliveryError> {
        self.try_enqueue(Outbound::Message(message))
    }

    /// Ask the writer to close the socket
    ///
    /// Waits for queue space so the close frame follows everything already queued.
    pub async fn close(&self, code: Option<CloseCode>) -> Result<(), DeliveryError> {
        self.sender
            .send(Outbound::Close(code))
            .await
            .map_err(|_| DeliveryError::Closed(self.id))
    }

    /// Check if the writer has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn try_enqueue(&self, item: Outbound) -> Result<(), DeliveryError> {
        self.sender.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull(self.id),
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed(self.id),
        })
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.identity.user_id)
            .field("state", &self.state())
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("created_at", &self.created_at)
            .finish()
    }
}
