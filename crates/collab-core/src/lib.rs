//! # collab-core
//!
//! Domain layer for the collaboration coordinator: identifiers, the authenticated
//! identity bound to a connection, and the ports to external collaborators.
//! This crate has zero dependencies on infrastructure (web framework, token format, etc.).

pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use error::DomainError;
pub use traits::{RevocationList, TokenValidator};
pub use value_objects::{ConnectionId, DocumentId, Identity, UserId};
