//! Ports - interfaces to collaborators outside the coordinator

mod credentials;

pub use credentials::{RevocationList, TokenValidator};
