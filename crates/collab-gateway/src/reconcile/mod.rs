//! Disconnect reconciliation
//!
//! Cleans up room membership after a connection ends for any reason.

mod reconciler;

pub use reconciler::{DisconnectReconciler, ReconcileReport};
