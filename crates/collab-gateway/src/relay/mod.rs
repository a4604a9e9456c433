//! Content relay
//!
//! Best-effort fan-out of editor content and caret positions within a room.

mod content;

pub use content::ContentRelay;
