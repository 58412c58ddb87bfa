//! Player Session
//!
//! The host view for one opened media item. Composes the player bridge,
//! the caption synchronizer (rendering into a [`CaptionView`]) and the
//! selection engine, and reaches the rest of the application through the
//! collaborator traits.

mod collaborators;
mod view;

pub use collaborators::{
    AttachmentStore, CaptionSource, FsAttachmentStore, LocalFileResolver, ResolvedSource,
    SidecarSrtSource, SourceResolver,
};
pub use view::CaptionView;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::bridge::{BridgeEvent, PlayerBridge, SurfaceConnector};
use crate::core::captions::{format_timestamp, Cue, TrackInfo};
use crate::core::selection::{HighlightContext, SelectionEngine};
use crate::core::settings::PlayerSettings;
use crate::core::sync::CaptionSynchronizer;
use crate::core::{CoreError, CoreResult, ImageFormat, MediaLocator, TimeSec};
use crate::ipc::{EventEmitter, NoticeLevel, SelectionEvent, ViewEvent};

/// Everything a session needs from the surrounding application
#[derive(Clone)]
pub struct SessionContext {
    pub captions: Arc<dyn CaptionSource>,
    pub resolver: Arc<dyn SourceResolver>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub highlight: HighlightContext,
    pub events: EventEmitter,
}

/// Builds the attachment name `<stem>-HH_MM_SS_mmm.<ext>` for a frame
pub fn screenshot_name(locator: &str, time: TimeSec, format: ImageFormat) -> String {
    let stem = Path::new(locator)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_stem)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "screenshot".to_string());
    let stamp = format_timestamp(time, '_').replace(':', "_");

    format!("{}-{}.{}", stem, stamp, format.extension())
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// One opened media item
pub struct PlayerSession {
    locator: MediaLocator,
    source: ResolvedSource,
    bridge: PlayerBridge,
    synchronizer: CaptionSynchronizer<CaptionView>,
    context: SessionContext,
    bridge_events: Option<mpsc::UnboundedReceiver<BridgeEvent>>,
    screenshot_format: ImageFormat,
    screenshot_quality: f64,
    closed: bool,
}

impl PlayerSession {
    /// Opens `raw_source`: resolves it, loads its captions and prepares the
    /// bridge. Missing captions leave the view empty.
    pub fn open(
        context: SessionContext,
        raw_source: &str,
        settings: &PlayerSettings,
    ) -> CoreResult<Self> {
        let source = context.resolver.resolve_source(raw_source)?;
        let locator: MediaLocator = raw_source.trim().to_string();

        let cues = if settings.captions.enabled {
            context.captions.load_captions(&locator).unwrap_or_else(|| {
                debug!("No captions for {}", locator);
                Vec::new()
            })
        } else {
            Vec::new()
        };

        let mut view = CaptionView::new(context.events.clone());
        view.attach_selection(SelectionEngine::new(
            context.highlight.clone(),
            locator.clone(),
            context.events.clone(),
        ));
        let synchronizer = CaptionSynchronizer::new(cues, view);

        let bridge = PlayerBridge::new(settings.bridge_config());
        let bridge_events = bridge.take_event_receiver();

        info!(
            "Opened {} ({} cues) at {}",
            locator,
            synchronizer.cues().len(),
            source.playable_url
        );

        Ok(Self {
            locator,
            source,
            bridge,
            synchronizer,
            context,
            bridge_events,
            screenshot_format: settings.screenshot_format(),
            screenshot_quality: settings.screenshot.quality,
            closed: false,
        })
    }

    /// Starts the player handshake
    pub fn connect<C: SurfaceConnector>(&self, connector: C) -> CoreResult<()> {
        if self.closed {
            return Err(CoreError::NoMediaOpen);
        }
        self.bridge.connect(connector)
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn source(&self) -> &ResolvedSource {
        &self.source
    }

    pub fn bridge(&self) -> &PlayerBridge {
        &self.bridge
    }

    pub fn events(&self) -> &EventEmitter {
        &self.context.events
    }

    pub fn highlight(&self) -> &HighlightContext {
        &self.context.highlight
    }

    pub fn view(&self) -> &CaptionView {
        self.synchronizer.renderer()
    }

    pub fn cues(&self) -> &[Cue] {
        self.synchronizer.cues()
    }

    pub fn current_cue(&self) -> Option<&Cue> {
        self.synchronizer.current_cue()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Caption tracks for the open media, passed through untouched
    pub fn tracks(&self) -> Vec<TrackInfo> {
        self.context.captions.tracks(&self.locator)
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Feeds a playback time sample to the synchronizer
    pub fn on_time_update(&mut self, time: TimeSec) {
        if self.closed {
            return;
        }
        self.synchronizer.update(time);
        self.context
            .events
            .emit(ViewEvent::TimeUpdated { current: time });
    }

    /// Applies one bridge notification
    pub fn handle_bridge_event(&mut self, event: &BridgeEvent) {
        match event {
            BridgeEvent::Ready => info!("Player ready for {}", self.locator),
            BridgeEvent::TimeUpdate(time) => self.on_time_update(*time),
            BridgeEvent::HandshakeFailed { attempts } => {
                self.context.events.notice(
                    NoticeLevel::Error,
                    format!("Player failed to start after {attempts} attempts"),
                );
            }
            BridgeEvent::Closed => {
                self.synchronizer.reset();
                self.context
                    .events
                    .notice(NoticeLevel::Error, "Player connection lost");
            }
        }
    }

    /// Waits for the next bridge notification and applies it.
    ///
    /// Returns `None` once the bridge can produce no more events.
    pub async fn process_next_event(&mut self) -> Option<BridgeEvent> {
        let event = self.bridge_events.as_mut()?.recv().await?;
        self.handle_bridge_event(&event);
        Some(event)
    }

    /// Seeks the player, buffering until the handshake completes.
    ///
    /// The displayed line is cleared; the next time sample picks the cue
    /// at the new position.
    pub async fn seek_to(&mut self, time: TimeSec) -> CoreResult<()> {
        if self.closed {
            return Err(CoreError::NoMediaOpen);
        }

        if let Err(e) = self.bridge.seek_to(time).await {
            warn!("Seek to {:.3}s failed: {}", time, e);
            self.context
                .events
                .notice(NoticeLevel::Error, format!("Seek failed: {}", e.to_ipc_error()));
            return Err(e);
        }

        self.synchronizer.reset();
        Ok(())
    }

    /// Captures the current frame and stores it as an attachment
    pub async fn capture_screenshot(&self) -> CoreResult<PathBuf> {
        if self.closed {
            return Err(CoreError::NoMediaOpen);
        }

        let result = self.save_screenshot().await;
        match &result {
            Ok(path) => {
                self.context.events.notice(
                    NoticeLevel::Info,
                    format!("Screenshot saved to {}", path.display()),
                );
            }
            Err(e) => {
                warn!("Screenshot of {} failed: {}", self.locator, e);
                self.context.events.notice(
                    NoticeLevel::Error,
                    format!("Screenshot failed: {}", e.to_ipc_error()),
                );
            }
        }
        result
    }

    async fn save_screenshot(&self) -> CoreResult<PathBuf> {
        let shot = self
            .bridge
            .screenshot(self.screenshot_format, self.screenshot_quality)
            .await?;

        let name = screenshot_name(&self.locator, shot.time, shot.format);
        self.context.attachments.save_attachment(&name, &shot.data)
    }

    // =========================================================================
    // Pointer Input
    // =========================================================================

    pub fn pointer_down(&mut self, position: usize) -> bool {
        self.synchronizer.renderer_mut().pointer_down(position)
    }

    pub fn pointer_move(&mut self, position: Option<usize>) -> bool {
        self.synchronizer.renderer_mut().pointer_move(position)
    }

    pub fn pointer_up(&mut self) -> Option<SelectionEvent> {
        self.synchronizer.renderer_mut().pointer_up()
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Closes the session: disposes the bridge and clears the view.
    /// Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.bridge.dispose();
        self.synchronizer.reset();
        info!("Closed {}", self.locator);
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.bridge.dispose();
    }
}
