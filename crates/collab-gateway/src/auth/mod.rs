//! Handshake authentication
//!
//! A connection is authenticated once, before the WebSocket upgrade. Rejected
//! handshakes never produce a connection.

mod authenticator;
mod error;
mod extractor;

pub use authenticator::{Authenticator, Handshake};
pub use error::AuthError;
pub use extractor::HubIdentity;
