//! IPC (Inter-Process Communication) Module
//!
//! Wire messages exchanged with the sandboxed player surface and the typed
//! events the player view broadcasts to its frontend.

mod events;
mod payloads;

pub use events::*;
pub use payloads::*;
