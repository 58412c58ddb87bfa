//! Lockstep Core Engine
//!
//! Caption parsing and synchronization, token selection, and the RPC bridge
//! to the sandboxed player surface.

pub mod bridge;
pub mod captions;
pub mod fs;
pub mod selection;
pub mod session;
pub mod settings;
pub mod sync;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
