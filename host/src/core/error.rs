//! Lockstep Error Definitions
//!
//! Defines error types used throughout the caption engine and player bridge.

use thiserror::Error;

/// Core engine error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    // =========================================================================
    // Caption Errors
    // =========================================================================
    #[error("Unsupported caption format: {0}")]
    UnsupportedFormat(String),

    // =========================================================================
    // Bridge Errors
    // =========================================================================
    #[error("Player channel is not ready")]
    ChannelNotReady,

    #[error("Player channel closed")]
    ChannelClosed,

    #[error("Player handshake failed after {attempts} attempts")]
    HandshakeFailed { attempts: u32 },

    #[error("Player bridge disposed")]
    Disposed,

    #[error("Remote error: {0}")]
    RemoteError(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Media element unavailable")]
    MediaUnavailable,

    #[error("Frame capture failed: {0}")]
    CaptureFailed(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("No media open")]
    NoMediaOpen,

    #[error("Attachment save failed: {0}")]
    AttachmentFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Convert to a user-friendly error message for IPC
    pub fn to_ipc_error(&self) -> String {
        self.to_string()
    }
}
