//! Value objects - immutable, identity-less domain types

mod identity;
mod ids;

pub use identity::Identity;
pub use ids::{ConnectionId, DocumentId, UserId};
