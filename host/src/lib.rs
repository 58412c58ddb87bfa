//! Lockstep Core Library
//!
//! Time-synchronized captions over an embedded media player.
//! This library contains the caption engine, the token selection engine,
//! the host/surface RPC bridge and the session that ties them together.
//!
//! ## Layout
//!
//! - [`core`]: engine modules and the shared error type
//! - [`ipc`]: wire messages exchanged with the player surface and the typed
//!   events the view broadcasts

pub mod core;
pub mod ipc;

pub use crate::core::bridge::{BridgeConfig, PlayerBridge, PlayerSurface};
pub use crate::core::captions::{parse_srt, Cue};
pub use crate::core::session::{PlayerSession, SessionContext};
pub use crate::core::{CoreError, CoreResult};
