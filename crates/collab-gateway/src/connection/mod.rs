//! Connection management
//!
//! Tracks live WebSocket connections and the bounded outbound queue of each.

mod connection;
mod manager;

pub use connection::{Connection, ConnectionState, DeliveryError, Outbound};
pub use manager::ConnectionManager;
