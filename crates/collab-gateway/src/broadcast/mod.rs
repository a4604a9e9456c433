//! Event broadcasting
//!
//! Delivers dispatch events to the members of a room or to a single connection.

mod fanout;

pub use fanout::RoomBroadcaster;
