//! Player Bridge (host side)
//!
//! Owns the handshake, call correlation, pending-seek buffering and teardown
//! for the host's end of the player channel.
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized --connect--> Handshaking --ready--> Ready --surface gone--> Closed
//!                                 |
//!                                 +--attempts spent--> Exhausted
//! (any) --dispose--> Disposed
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, info, warn};

use super::channel::{message_channel, Bootstrap, Reply, SurfaceConnector};
use super::config::BridgeConfig;
use crate::core::{new_call_id, CallId, CoreError, CoreResult, ImageFormat, TimeSec};
use crate::ipc::{methods, HostMessage, ScreenshotMeta, SurfaceMessage};

// =============================================================================
// Types
// =============================================================================

/// Channel lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelState {
    Uninitialized,
    Handshaking,
    Ready,
    /// Handshake attempts spent without a readiness signal
    Exhausted,
    /// The surface dropped an established channel
    Closed,
    Disposed,
}

/// Notifications raised by the bridge
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeEvent {
    Ready,
    TimeUpdate(TimeSec),
    HandshakeFailed { attempts: u32 },
    Closed,
}

/// Captured frame
#[derive(Clone, Debug, PartialEq)]
pub struct Screenshot {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    /// Playback time of the frame
    pub time: TimeSec,
}

type PendingReply = oneshot::Sender<CoreResult<Reply>>;
type PendingResponse = oneshot::Receiver<CoreResult<Reply>>;

#[derive(Default)]
struct Core {
    attempts: u32,
    /// Last seek requested before the channel was ready
    pending_seek: Option<TimeSec>,
    outgoing: Option<mpsc::UnboundedSender<HostMessage>>,
    tasks: Vec<JoinHandle<()>>,
}

struct BridgeInner {
    config: BridgeConfig,
    state: watch::Sender<ChannelState>,
    /// State transitions and the pending seek are guarded together
    core: Mutex<Core>,
    pending: Mutex<HashMap<CallId, PendingReply>>,
    events: mpsc::UnboundedSender<BridgeEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<BridgeEvent>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BridgeInner {
    fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    fn emit(&self, event: BridgeEvent) {
        let _ = self.events.send(event);
    }

    /// Registers a pending call and posts its invocation on `outgoing`
    fn dispatch(
        &self,
        outgoing: &mpsc::UnboundedSender<HostMessage>,
        method: &str,
        args: Vec<Value>,
    ) -> CoreResult<(CallId, PendingResponse)> {
        let id = new_call_id();
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id.clone(), tx);

        let message = HostMessage::Invoke {
            id: id.clone(),
            method: method.to_string(),
            args,
        };
        if outgoing.send(message).is_err() {
            lock(&self.pending).remove(&id);
            return Err(CoreError::ChannelClosed);
        }
        Ok((id, rx))
    }

    /// Commits the Ready transition.
    ///
    /// A buffered seek is posted before the state flips, so any seek issued
    /// after readiness is observed queues behind it.
    fn mark_ready(
        &self,
        outgoing: mpsc::UnboundedSender<HostMessage>,
    ) -> Option<Option<(TimeSec, PendingResponse)>> {
        let mut core = lock(&self.core);
        if self.state() == ChannelState::Disposed {
            return None;
        }

        let flushed = core.pending_seek.take().and_then(|time| {
            match self.dispatch(&outgoing, methods::SEEK, vec![json!(time)]) {
                Ok((_, rx)) => Some((time, rx)),
                Err(e) => {
                    warn!("Buffered seek to {:.3}s not sent: {}", time, e);
                    None
                }
            }
        });

        core.outgoing = Some(outgoing);
        self.state.send_replace(ChannelState::Ready);
        info!("Player channel ready after {} attempt(s)", core.attempts);
        Some(flushed)
    }

    fn mark_exhausted(&self) {
        let attempts = {
            let core = lock(&self.core);
            if self.state() == ChannelState::Disposed {
                return;
            }
            self.state.send_replace(ChannelState::Exhausted);
            core.attempts
        };
        warn!("Player handshake failed after {} attempts", attempts);
        self.emit(BridgeEvent::HandshakeFailed { attempts });
    }

    fn mark_closed(&self) {
        {
            let mut core = lock(&self.core);
            if self.state() == ChannelState::Disposed {
                return;
            }
            core.outgoing = None;
            self.state.send_replace(ChannelState::Closed);
        }

        let abandoned: Vec<PendingReply> = lock(&self.pending).drain().map(|(_, tx)| tx).collect();
        warn!(
            "Player channel closed by surface, rejecting {} pending call(s)",
            abandoned.len()
        );
        for tx in abandoned {
            let _ = tx.send(Err(CoreError::ChannelClosed));
        }
        self.emit(BridgeEvent::Closed);
    }

    fn handle_message(&self, message: SurfaceMessage) {
        match message {
            SurfaceMessage::Ready => debug!("Ignoring repeated ready signal"),
            SurfaceMessage::TimeUpdate { current } => self.emit(BridgeEvent::TimeUpdate(current)),
            SurfaceMessage::Response {
                id,
                result,
                error,
                transfer,
            } => {
                let Some(tx) = lock(&self.pending).remove(&id) else {
                    debug!("Ignoring response for unknown call {}", id);
                    return;
                };

                let outcome = match error {
                    Some(message) => Err(CoreError::RemoteError(message)),
                    None => Ok(Reply {
                        value: result.unwrap_or(Value::Null),
                        transfer,
                    }),
                };
                let _ = tx.send(outcome);
            }
        }
    }
}

/// Waits for the readiness signal; `false` once the surface end is dropped
async fn wait_for_ready(rx: &mut mpsc::UnboundedReceiver<SurfaceMessage>) -> bool {
    while let Some(message) = rx.recv().await {
        if message == SurfaceMessage::Ready {
            return true;
        }
        debug!("Ignoring {:?} before ready", message);
    }
    false
}

async fn run_handshake<C: SurfaceConnector>(inner: Arc<BridgeInner>, connector: C) {
    loop {
        let attempt = {
            let mut core = lock(&inner.core);
            if inner.state() == ChannelState::Disposed {
                return;
            }
            core.attempts += 1;
            core.attempts
        };
        info!(
            "Player handshake attempt {}/{}",
            attempt, inner.config.max_attempts
        );

        let (host_port, surface_port) = message_channel();
        let (tx, mut rx) = host_port.into_parts();
        let deadline = Instant::now() + inner.config.retry_delay;

        if let Err(e) = connector.connect(Bootstrap::new(surface_port)) {
            warn!("Failed to deliver player bootstrap: {}", e);
        }

        if let Ok(true) = timeout_at(deadline, wait_for_ready(&mut rx)).await {
            let Some(buffered_seek) = inner.mark_ready(tx) else {
                return;
            };
            inner.emit(BridgeEvent::Ready);

            if let Some((time, response)) = buffered_seek {
                info!("Flushed buffered seek to {:.3}s", time);
                tokio::spawn(async move {
                    if let Err(e) = response.await.unwrap_or(Err(CoreError::Disposed)) {
                        warn!("Buffered seek failed: {}", e);
                    }
                });
            }

            while let Some(message) = rx.recv().await {
                inner.handle_message(message);
            }
            inner.mark_closed();
            return;
        }

        // A surface that drops the channel early still waits out the attempt.
        sleep_until(deadline).await;

        if attempt >= inner.config.max_attempts {
            inner.mark_exhausted();
            return;
        }
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Host end of the player channel. Clones share the same channel.
#[derive(Clone)]
pub struct PlayerBridge {
    inner: Arc<BridgeInner>,
}

impl PlayerBridge {
    pub fn new(config: BridgeConfig) -> Self {
        let (state, _) = watch::channel(ChannelState::Uninitialized);
        let (events, event_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(BridgeInner {
                config,
                state,
                core: Mutex::new(Core::default()),
                pending: Mutex::new(HashMap::new()),
                events,
                event_rx: Mutex::new(Some(event_rx)),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ChannelState {
        self.inner.state()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ChannelState::Ready
    }

    /// Handshake attempts made so far
    pub fn attempts(&self) -> u32 {
        lock(&self.inner.core).attempts
    }

    /// Number of invocations awaiting a response
    pub fn pending_calls(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    /// Seek buffered until readiness, if any
    pub fn pending_seek(&self) -> Option<TimeSec> {
        lock(&self.inner.core).pending_seek
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.inner.state.subscribe()
    }

    /// Takes the event receiver (can only be called once)
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<BridgeEvent>> {
        lock(&self.inner.event_rx).take()
    }

    /// Starts the handshake with the surface reachable through `connector`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect<C: SurfaceConnector>(&self, connector: C) -> CoreResult<()> {
        let mut core = lock(&self.inner.core);
        match self.state() {
            ChannelState::Uninitialized => {}
            ChannelState::Disposed => return Err(CoreError::Disposed),
            other => {
                return Err(CoreError::Internal(format!(
                    "player bridge already connected ({other:?})"
                )))
            }
        }

        self.inner.state.send_replace(ChannelState::Handshaking);
        let task = tokio::spawn(run_handshake(Arc::clone(&self.inner), connector));
        core.tasks.push(task);
        Ok(())
    }

    /// Resolves once the channel is ready, or fails with the terminal state
    pub async fn wait_ready(&self) -> CoreResult<()> {
        let mut rx = self.inner.state.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            match state {
                ChannelState::Ready => return Ok(()),
                ChannelState::Exhausted => {
                    return Err(CoreError::HandshakeFailed {
                        attempts: self.attempts(),
                    })
                }
                ChannelState::Closed => return Err(CoreError::ChannelClosed),
                ChannelState::Disposed => return Err(CoreError::Disposed),
                ChannelState::Uninitialized | ChannelState::Handshaking => {}
            }

            if rx.changed().await.is_err() {
                return Err(CoreError::Disposed);
            }
        }
    }

    /// Invokes `method` on the surface and waits for its correlated response.
    ///
    /// Fails immediately when the channel is not ready.
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> CoreResult<Reply> {
        let (id, rx) = {
            let core = lock(&self.inner.core);
            match self.state() {
                ChannelState::Ready => {}
                ChannelState::Disposed => return Err(CoreError::Disposed),
                ChannelState::Closed => return Err(CoreError::ChannelClosed),
                _ => return Err(CoreError::ChannelNotReady),
            }
            let outgoing = core.outgoing.as_ref().ok_or(CoreError::ChannelNotReady)?;
            self.inner.dispatch(outgoing, method, args)?
        };

        debug!("Invoked {} as call {}", method, id);
        rx.await.unwrap_or(Err(CoreError::Disposed))
    }

    /// Seeks immediately; requires a ready channel
    pub async fn seek(&self, time: TimeSec) -> CoreResult<()> {
        self.invoke(methods::SEEK, vec![json!(time)]).await?;
        Ok(())
    }

    /// Seeks now, or buffers the request until the handshake completes.
    ///
    /// Only the most recent buffered seek is kept.
    pub async fn seek_to(&self, time: TimeSec) -> CoreResult<()> {
        {
            let mut core = lock(&self.inner.core);
            match self.state() {
                ChannelState::Ready => {}
                ChannelState::Uninitialized | ChannelState::Handshaking => {
                    if let Some(previous) = core.pending_seek.replace(time) {
                        debug!("Buffered seek {:.3}s replaced by {:.3}s", previous, time);
                    }
                    return Ok(());
                }
                ChannelState::Exhausted => {
                    return Err(CoreError::HandshakeFailed {
                        attempts: core.attempts,
                    })
                }
                ChannelState::Closed => return Err(CoreError::ChannelClosed),
                ChannelState::Disposed => return Err(CoreError::Disposed),
            }
        }

        self.seek(time).await
    }

    /// Captures the current frame
    pub async fn screenshot(&self, format: ImageFormat, quality: f64) -> CoreResult<Screenshot> {
        let reply = self
            .invoke(
                methods::SCREENSHOT,
                vec![json!(format.mime_type()), json!(quality)],
            )
            .await?;

        let meta: ScreenshotMeta = serde_json::from_value(reply.value)?;
        let data = reply
            .transfer
            .ok_or_else(|| CoreError::CaptureFailed("response carried no image data".into()))?;

        Ok(Screenshot {
            data,
            format: ImageFormat::parse(&meta.mime_type).unwrap_or(format),
            time: meta.time,
        })
    }

    /// Tears the bridge down. Idempotent.
    ///
    /// Pending calls are rejected, the buffered seek is dropped and no
    /// further handshake attempts are made.
    pub fn dispose(&self) {
        let tasks = {
            let mut core = lock(&self.inner.core);
            if self.state() == ChannelState::Disposed {
                return;
            }
            self.inner.state.send_replace(ChannelState::Disposed);
            core.pending_seek = None;
            core.outgoing = None;
            std::mem::take(&mut core.tasks)
        };

        for task in tasks {
            task.abort();
        }

        let abandoned: Vec<PendingReply> =
            lock(&self.inner.pending).drain().map(|(_, tx)| tx).collect();
        info!(
            "Player bridge disposed, rejecting {} pending call(s)",
            abandoned.len()
        );
        for tx in abandoned {
            let _ = tx.send(Err(CoreError::Disposed));
        }
    }
}

impl std::fmt::Debug for PlayerBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerBridge")
            .field("state", &self.state())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}
