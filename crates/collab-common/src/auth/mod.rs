//! Credential validation utilities

mod jwt;
mod revocation;

pub use jwt::{Claims, JwtService};
pub use revocation::InMemoryRevocationList;
