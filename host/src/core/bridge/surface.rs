//! Player Surface
//!
//! The sandboxed side of the bridge. Listens for bootstrap messages, waits
//! for the media element to exist, then announces readiness and serves
//! method invocations against it. Each new bootstrap replaces the channel
//! being served.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use super::channel::{Bootstrap, Reply, SurfacePort};
use super::config::BridgeConfig;
use crate::core::{CoreError, CoreResult, ImageFormat, TimeSec};
use crate::ipc::{methods, HostMessage, ScreenshotMeta, SurfaceMessage, BOOTSTRAP_SENTINEL};

/// Default encoder quality for captures that do not specify one
pub const DEFAULT_CAPTURE_QUALITY: f64 = 0.92;

// =============================================================================
// Media Element
// =============================================================================

/// Playback element living inside the sandboxed surface
pub trait MediaElement: Send + 'static {
    fn current_time(&self) -> TimeSec;
    fn set_current_time(&mut self, time: TimeSec);
    fn is_paused(&self) -> bool;
    fn is_ended(&self) -> bool;
    fn play(&mut self) -> CoreResult<()>;

    /// Encodes the frame at the current position
    fn capture_frame(&mut self, format: ImageFormat, quality: f64) -> CoreResult<Vec<u8>>;
}

/// Shared slot the page fills once its media element has been created
#[derive(Clone, Default)]
pub struct MediaSlot {
    element: Arc<Mutex<Option<Box<dyn MediaElement>>>>,
}

impl MediaSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the media element
    pub fn insert(&self, element: impl MediaElement) {
        *self.lock() = Some(Box::new(element));
    }

    /// Removes the media element
    pub fn remove(&self) {
        self.lock().take();
    }

    pub fn is_present(&self) -> bool {
        self.lock().is_some()
    }

    /// Runs `f` against the media element
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn MediaElement) -> R) -> CoreResult<R> {
        let mut guard = self.lock();
        let element = guard.as_deref_mut().ok_or(CoreError::MediaUnavailable)?;
        Ok(f(element))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn MediaElement>>> {
        self.element.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MediaSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSlot")
            .field("present", &self.is_present())
            .finish()
    }
}

// =============================================================================
// Method Handlers
// =============================================================================

type Handler = Box<dyn Fn(&MediaSlot, &[Value]) -> CoreResult<Reply> + Send + Sync>;

/// `seek(time)`: sets the position and resumes if paused or ended
fn handle_seek(media: &MediaSlot, args: &[Value]) -> CoreResult<Reply> {
    let time = args
        .first()
        .and_then(Value::as_f64)
        .ok_or_else(|| CoreError::InvalidArguments("seek expects a time in seconds".into()))?;

    media.with(|element| {
        element.set_current_time(time);
        if element.is_paused() || element.is_ended() {
            element.play()
        } else {
            Ok(())
        }
    })??;

    Ok(Reply::value(Value::Null))
}

/// `screenshot(type, quality)`: encodes the current frame
fn handle_screenshot(media: &MediaSlot, args: &[Value]) -> CoreResult<Reply> {
    let format = match args.first().and_then(Value::as_str) {
        Some(name) => ImageFormat::parse(name)
            .ok_or_else(|| CoreError::InvalidArguments(format!("unsupported image type: {name}")))?,
        None => ImageFormat::default(),
    };
    let quality = args
        .get(1)
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_CAPTURE_QUALITY)
        .clamp(0.0, 1.0);

    let (time, bytes) = media.with(|element| {
        let time = element.current_time();
        element.capture_frame(format, quality).map(|bytes| (time, bytes))
    })??;

    if bytes.is_empty() {
        return Err(CoreError::CaptureFailed("encoder produced no data".into()));
    }

    let meta = ScreenshotMeta {
        mime_type: format.mime_type().to_string(),
        time,
        size: bytes.len(),
    };
    Ok(Reply::with_transfer(serde_json::to_value(meta)?, bytes))
}

// =============================================================================
// Surface
// =============================================================================

struct SurfaceShared {
    media: MediaSlot,
    config: BridgeConfig,
    handlers: HashMap<String, Handler>,
    /// Sender of the channel currently being served
    outgoing: Mutex<Option<mpsc::UnboundedSender<SurfaceMessage>>>,
    /// Task serving the current channel
    serving: Mutex<Option<AbortHandle>>,
}

impl SurfaceShared {
    fn dispatch(&self, method: &str, args: &[Value]) -> CoreResult<Reply> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| CoreError::UnknownMethod(method.to_string()))?;
        handler(&self.media, args)
    }

    fn outgoing(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<SurfaceMessage>>> {
        self.outgoing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn serving(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.serving.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for the sandboxed side of the bridge
pub struct PlayerSurface {
    media: MediaSlot,
    config: BridgeConfig,
    handlers: HashMap<String, Handler>,
}

impl PlayerSurface {
    /// Creates a surface exposing `seek` and `screenshot`
    pub fn new(media: MediaSlot, config: BridgeConfig) -> Self {
        let mut surface = Self {
            media,
            config,
            handlers: HashMap::new(),
        };
        surface.register(methods::SEEK, handle_seek);
        surface.register(methods::SCREENSHOT, handle_screenshot);
        surface
    }

    /// Registers (or replaces) a method handler
    pub fn register<F>(&mut self, method: &str, handler: F)
    where
        F: Fn(&MediaSlot, &[Value]) -> CoreResult<Reply> + Send + Sync + 'static,
    {
        self.handlers.insert(method.to_string(), Box::new(handler));
    }

    /// Registered method names
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Starts listening for bootstrap messages
    pub fn spawn(self, mut bootstraps: mpsc::UnboundedReceiver<Bootstrap>) -> SurfaceHandle {
        let shared = Arc::new(SurfaceShared {
            media: self.media,
            config: self.config,
            handlers: self.handlers,
            outgoing: Mutex::new(None),
            serving: Mutex::new(None),
        });

        let listener_shared = Arc::clone(&shared);
        let listener = tokio::spawn(async move {
            let mut current: Option<JoinHandle<()>> = None;

            while let Some(bootstrap) = bootstraps.recv().await {
                if bootstrap.sentinel != BOOTSTRAP_SENTINEL {
                    debug!("Ignoring bootstrap with foreign sentinel {}", bootstrap.sentinel);
                    continue;
                }

                if let Some(previous) = current.take() {
                    debug!("Replacing served player channel");
                    previous.abort();
                }

                let task = tokio::spawn(serve(bootstrap.port, Arc::clone(&listener_shared)));
                *listener_shared.serving() = Some(task.abort_handle());
                current = Some(task);
            }

            // Host stopped handshaking; keep serving the established channel.
            if let Some(task) = current {
                let _ = task.await;
            }
        });

        SurfaceHandle {
            shared,
            listener: listener.abort_handle(),
        }
    }
}

async fn serve(port: SurfacePort, shared: Arc<SurfaceShared>) {
    let (tx, mut rx) = port.into_parts();

    let mut ticker = tokio::time::interval(shared.config.media_poll_interval);
    while !shared.media.is_present() {
        ticker.tick().await;
        if tx.is_closed() {
            debug!("Player channel dropped before media element appeared");
            return;
        }
    }

    *shared.outgoing() = Some(tx.clone());
    if tx.send(SurfaceMessage::Ready).is_err() {
        return;
    }
    info!("Player surface ready with {} methods", shared.handlers.len());

    while let Some(HostMessage::Invoke { id, method, args }) = rx.recv().await {
        let response = match shared.dispatch(&method, &args) {
            Ok(reply) => SurfaceMessage::ok(id, reply.value, reply.transfer),
            Err(e) => {
                warn!("Player method {} failed: {}", method, e);
                SurfaceMessage::err(id, e.to_ipc_error())
            }
        };

        if tx.send(response).is_err() {
            break;
        }
    }

    debug!("Player channel closed by host");
}

/// Control handle for a running surface
pub struct SurfaceHandle {
    shared: Arc<SurfaceShared>,
    listener: AbortHandle,
}

impl SurfaceHandle {
    /// Media slot shared with the page
    pub fn media(&self) -> &MediaSlot {
        &self.shared.media
    }

    /// Sends an unsolicited playback position report.
    ///
    /// Returns `false` when no channel is established.
    pub fn report_time(&self, current: TimeSec) -> bool {
        match self.shared.outgoing().as_ref() {
            Some(tx) => tx.send(SurfaceMessage::TimeUpdate { current }).is_ok(),
            None => false,
        }
    }

    /// Stops listening and closes the served channel
    pub fn shutdown(&self) {
        self.listener.abort();
        if let Some(task) = self.shared.serving().take() {
            task.abort();
        }
        self.shared.outgoing().take();
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bridge::message_channel;
    use crate::core::bridge::testing::FakeMedia;
    use serde_json::json;

    // -------------------------------------------------------------------------
    // Handlers
    // -------------------------------------------------------------------------

    #[test]
    fn test_seek_sets_time_and_resumes() {
        let media = FakeMedia::paused_at(1.0);
        let slot = MediaSlot::new();
        slot.insert(media.clone());

        let reply = handle_seek(&slot, &[json!(12.5)]).unwrap();
        assert_eq!(reply.value, Value::Null);
        assert_eq!(media.seeks(), vec![12.5]);
        assert_eq!(media.plays(), 1);
    }

    #[test]
    fn test_seek_while_playing_does_not_call_play() {
        let media = FakeMedia::playing_at(1.0);
        let slot = MediaSlot::new();
        slot.insert(media.clone());

        handle_seek(&slot, &[json!(3.0)]).unwrap();
        assert_eq!(media.plays(), 0);
    }

    #[test]
    fn test_seek_rejects_bad_arguments() {
        let slot = MediaSlot::new();
        slot.insert(FakeMedia::paused_at(0.0));

        let result = handle_seek(&slot, &[json!("soon")]);
        assert!(matches!(result, Err(CoreError::InvalidArguments(_))));
    }

    #[test]
    fn test_handlers_require_media() {
        let slot = MediaSlot::new();
        assert_eq!(
            handle_seek(&slot, &[json!(1.0)]),
            Err(CoreError::MediaUnavailable)
        );
    }

    #[test]
    fn test_screenshot_returns_meta_and_transfer() {
        let slot = MediaSlot::new();
        slot.insert(FakeMedia::paused_at(7.25));

        let reply = handle_screenshot(&slot, &[json!("image/jpeg"), json!(0.8)]).unwrap();
        let meta: ScreenshotMeta = serde_json::from_value(reply.value).unwrap();
        let bytes = reply.transfer.unwrap();

        assert_eq!(meta.mime_type, "image/jpeg");
        assert_eq!(meta.time, 7.25);
        assert_eq!(meta.size, bytes.len());
    }

    #[test]
    fn test_screenshot_capture_failure() {
        let media = FakeMedia::paused_at(0.0);
        media.fail_capture();
        let slot = MediaSlot::new();
        slot.insert(media);

        let result = handle_screenshot(&slot, &[]);
        assert!(matches!(result, Err(CoreError::CaptureFailed(_))));
    }

    #[test]
    fn test_default_methods() {
        let surface = PlayerSurface::new(MediaSlot::new(), BridgeConfig::default());
        assert_eq!(surface.methods(), vec!["screenshot", "seek"]);
    }

    // -------------------------------------------------------------------------
    // Serving
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_ready_waits_for_media_element() {
        let config =
            BridgeConfig::default().with_media_poll_interval(std::time::Duration::from_millis(5));
        let slot = MediaSlot::new();
        let (bootstrap_tx, bootstrap_rx) = mpsc::unbounded_channel();
        let _handle = PlayerSurface::new(slot.clone(), config).spawn(bootstrap_rx);

        let (mut host, surface_port) = message_channel();
        bootstrap_tx.send(Bootstrap::new(surface_port)).unwrap();

        let early =
            tokio::time::timeout(std::time::Duration::from_millis(50), host.recv()).await;
        assert!(early.is_err(), "ready must not be sent without media");

        slot.insert(FakeMedia::paused_at(0.0));
        assert_eq!(host.recv().await, Some(SurfaceMessage::Ready));
    }

    #[tokio::test]
    async fn test_unknown_method_reports_error() {
        let slot = MediaSlot::new();
        slot.insert(FakeMedia::paused_at(0.0));
        let (bootstrap_tx, bootstrap_rx) = mpsc::unbounded_channel();
        let _handle = PlayerSurface::new(slot, BridgeConfig::default()).spawn(bootstrap_rx);

        let (mut host, surface_port) = message_channel();
        bootstrap_tx.send(Bootstrap::new(surface_port)).unwrap();
        assert_eq!(host.recv().await, Some(SurfaceMessage::Ready));

        host.post(HostMessage::Invoke {
            id: "x1".to_string(),
            method: "rewind".to_string(),
            args: vec![],
        })
        .unwrap();

        assert_eq!(
            host.recv().await,
            Some(SurfaceMessage::err("x1".to_string(), "Unknown method: rewind"))
        );
    }

    #[tokio::test]
    async fn test_report_time_requires_channel() {
        let slot = MediaSlot::new();
        slot.insert(FakeMedia::paused_at(0.0));
        let (bootstrap_tx, bootstrap_rx) = mpsc::unbounded_channel();
        let handle = PlayerSurface::new(slot, BridgeConfig::default()).spawn(bootstrap_rx);

        assert!(!handle.report_time(1.0));

        let (mut host, surface_port) = message_channel();
        bootstrap_tx.send(Bootstrap::new(surface_port)).unwrap();
        assert_eq!(host.recv().await, Some(SurfaceMessage::Ready));

        assert!(handle.report_time(2.5));
        assert_eq!(
            host.recv().await,
            Some(SurfaceMessage::TimeUpdate { current: 2.5 })
        );
    }
}
