//! Presence broadcasting
//!
//! Announces joins and leaves to a room and hands joiners a participant snapshot.

mod broadcaster;

pub use broadcaster::{JoinOutcome, PresenceBroadcaster};
