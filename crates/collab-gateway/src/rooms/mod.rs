//! Room registry
//!
//! Ephemeral per-document rooms and the connection to identity index.

mod registry;

pub use registry::RoomRegistry;
