//! Player Channel Wire Messages
//!
//! Conceptual JSON shapes exchanged over the duplex player channel:
//!
//! ```text
//! host    -> surface   {"type":"invoke","id":"01J..","method":"seek","args":[12.5]}
//! surface -> host      {"type":"ready"}
//! surface -> host      {"type":"timeupdate","current":12.75}
//! surface -> host      {"type":"response","id":"01J..","result":null}
//! surface -> host      {"type":"response","id":"01J..","error":"Media element unavailable"}
//! ```
//!
//! Binary payloads ride alongside a response in `transfer` and are moved,
//! never serialized or copied.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{CallId, TimeSec};

/// Sentinel carried by the bootstrap message that hands over a channel end
pub const BOOTSTRAP_SENTINEL: &str = "lockstep:player-port";

/// Method names exposed by the player surface
pub mod methods {
    /// `seek(time)`: set playback position, resuming if paused or ended
    pub const SEEK: &str = "seek";
    /// `screenshot(type, quality)`: capture the current frame
    pub const SCREENSHOT: &str = "screenshot";
}

/// Host to surface message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    Invoke {
        id: CallId,
        method: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

/// Surface to host message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceMessage {
    /// Method handlers are registered and the media element exists
    Ready,
    /// Unsolicited playback position report
    #[serde(rename = "timeupdate")]
    TimeUpdate { current: TimeSec },
    /// Reply to an `invoke`
    Response {
        id: CallId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip)]
        transfer: Option<Vec<u8>>,
    },
}

impl SurfaceMessage {
    /// Successful response
    pub fn ok(id: CallId, result: Value, transfer: Option<Vec<u8>>) -> Self {
        Self::Response {
            id,
            result: Some(result),
            error: None,
            transfer,
        }
    }

    /// Failed response
    pub fn err(id: CallId, error: impl Into<String>) -> Self {
        Self::Response {
            id,
            result: None,
            error: Some(error.into()),
            transfer: None,
        }
    }
}

/// Metadata returned by `screenshot`; the encoded image travels as transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotMeta {
    /// MIME type of the encoded image
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Playback time of the captured frame
    pub time: TimeSec,
    /// Encoded size in bytes
    pub size: usize,
}
