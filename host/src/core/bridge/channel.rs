//! Duplex Player Channel
//!
//! An in-memory message channel with two ends. The host keeps one end and
//! hands the other to the sandboxed surface inside a [`Bootstrap`] message.
//! Messages are moved through the channel, so binary payloads are
//! transferred rather than copied.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::{CoreError, CoreResult};
use crate::ipc::{HostMessage, SurfaceMessage, BOOTSTRAP_SENTINEL};

/// One end of the duplex channel
#[derive(Debug)]
pub struct Port<Out, In> {
    tx: mpsc::UnboundedSender<Out>,
    rx: mpsc::UnboundedReceiver<In>,
}

/// Host end: sends invocations, receives surface messages
pub type HostPort = Port<HostMessage, SurfaceMessage>;

/// Surface end: sends surface messages, receives invocations
pub type SurfacePort = Port<SurfaceMessage, HostMessage>;

impl<Out, In> Port<Out, In> {
    /// Posts a message to the other end
    pub fn post(&self, message: Out) -> CoreResult<()> {
        self.tx.send(message).map_err(|_| CoreError::ChannelClosed)
    }

    /// Receives the next message; `None` once the other end is gone
    pub async fn recv(&mut self) -> Option<In> {
        self.rx.recv().await
    }

    /// Splits into the sending and receiving halves
    pub fn into_parts(self) -> (mpsc::UnboundedSender<Out>, mpsc::UnboundedReceiver<In>) {
        (self.tx, self.rx)
    }
}

/// Creates a connected pair of ports
pub fn message_channel() -> (HostPort, SurfacePort) {
    let (host_tx, surface_rx) = mpsc::unbounded_channel();
    let (surface_tx, host_rx) = mpsc::unbounded_channel();

    (
        Port {
            tx: host_tx,
            rx: host_rx,
        },
        Port {
            tx: surface_tx,
            rx: surface_rx,
        },
    )
}

/// Handshake trigger carrying the surface's end of a fresh channel
#[derive(Debug)]
pub struct Bootstrap {
    pub sentinel: &'static str,
    pub port: SurfacePort,
}

impl Bootstrap {
    pub fn new(port: SurfacePort) -> Self {
        Self {
            sentinel: BOOTSTRAP_SENTINEL,
            port,
        }
    }
}

/// Cross-context delivery of a [`Bootstrap`] to the sandboxed surface
pub trait SurfaceConnector: Send + Sync + 'static {
    fn connect(&self, bootstrap: Bootstrap) -> CoreResult<()>;
}

impl SurfaceConnector for mpsc::UnboundedSender<Bootstrap> {
    fn connect(&self, bootstrap: Bootstrap) -> CoreResult<()> {
        self.send(bootstrap).map_err(|_| CoreError::ChannelClosed)
    }
}

/// Result payload of a method invocation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reply {
    /// JSON result
    pub value: Value,
    /// Binary payload moved alongside the result
    pub transfer: Option<Vec<u8>>,
}

impl Reply {
    pub fn value(value: Value) -> Self {
        Self {
            value,
            transfer: None,
        }
    }

    pub fn with_transfer(value: Value, transfer: Vec<u8>) -> Self {
        Self {
            value,
            transfer: Some(transfer),
        }
    }
}
