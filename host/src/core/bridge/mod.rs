//! Player RPC Bridge
//!
//! Request/response messaging between the host and a sandboxed player
//! surface over a duplex in-memory channel: handshake with bounded retry,
//! id-correlated calls, buffered seeking and deterministic teardown.

mod channel;
mod config;
mod host;
mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{
    message_channel, Bootstrap, HostPort, Port, Reply, SurfaceConnector, SurfacePort,
};
pub use config::{BridgeConfig, DEFAULT_MAX_ATTEMPTS};
pub use host::{BridgeEvent, ChannelState, PlayerBridge, Screenshot};
pub use surface::{
    MediaElement, MediaSlot, PlayerSurface, SurfaceHandle, DEFAULT_CAPTURE_QUALITY,
};
