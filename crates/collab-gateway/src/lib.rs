//! # collab-gateway
//!
//! WebSocket gateway coordinating real-time document collaboration: handshake
//! authentication, per-document rooms, presence, and content relay.

pub mod auth;
pub mod broadcast;
pub mod connection;
pub mod events;
pub mod handlers;
pub mod presence;
pub mod protocol;
pub mod reconcile;
pub mod relay;
pub mod rooms;
pub mod server;


pub use server::{create_app, create_gateway_state, run, serve, GatewayState};
