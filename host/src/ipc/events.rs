//! View Event Emission Module
//!
//! Typed events broadcast by the player view to whoever renders it.
//! The emitter is owned by the view layer and injected into the caption and
//! selection components, replacing ad-hoc document-level custom events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::core::{LineNumber, MediaLocator, TimeSec, TokenIndex};

// =============================================================================
// Event Types
// =============================================================================

/// Event names used for frontend communication
pub mod event_names {
    /// A caption line was rendered
    pub const LINE_RENDERED: &str = "caption:line-rendered";
    /// The caption line was cleared
    pub const CAPTIONS_CLEARED: &str = "caption:cleared";
    /// A drag selection was merged
    pub const SELECTION_COMPLETED: &str = "selection:completed";
    /// Playback time reported by the player
    pub const TIME_UPDATED: &str = "playback:time-updated";
    /// Transient user notice
    pub const NOTICE: &str = "notice:show";
}

// =============================================================================
// Event Payloads
// =============================================================================

/// Caption line rendered event payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRenderedEvent {
    /// Originating line number
    pub line: LineNumber,
    /// Index of the cue in the sorted cue list
    pub cue_index: usize,
    /// Cue start in seconds
    pub start: TimeSec,
    /// Cue end in seconds
    pub end: TimeSec,
    /// Number of selectable word tokens
    pub token_count: usize,
}

/// Selection-complete event payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEvent {
    /// Merged text, tokens joined by single spaces
    pub text: String,
    /// Originating line number
    pub line: LineNumber,
    /// First selected token index
    pub start: TokenIndex,
    /// Last selected token index
    pub end: TokenIndex,
    /// Media locator supplied by the host
    pub locator: MediaLocator,
    /// Start time of the displayed cue
    pub time: TimeSec,
}

/// Severity of a transient notice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient notice payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeEvent {
    /// Message shown to the user
    pub message: String,
    /// Severity
    pub level: NoticeLevel,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl NoticeEvent {
    /// Creates a notice stamped with the current time
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Events emitted by the player view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ViewEvent {
    LineRendered(LineRenderedEvent),
    CaptionsCleared,
    SelectionCompleted(SelectionEvent),
    TimeUpdated { current: TimeSec },
    Notice(NoticeEvent),
}

impl ViewEvent {
    /// Frontend event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::LineRendered(_) => event_names::LINE_RENDERED,
            Self::CaptionsCleared => event_names::CAPTIONS_CLEARED,
            Self::SelectionCompleted(_) => event_names::SELECTION_COMPLETED,
            Self::TimeUpdated { .. } => event_names::TIME_UPDATED,
            Self::Notice(_) => event_names::NOTICE,
        }
    }
}

// =============================================================================
// Event Emitter
// =============================================================================

/// Default number of buffered events per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Broadcasts [`ViewEvent`]s to any number of subscribers
#[derive(Clone, Debug)]
pub struct EventEmitter {
    tx: broadcast::Sender<ViewEvent>,
}

impl EventEmitter {
    /// Creates an emitter buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.tx.subscribe()
    }

    /// Emits an event; returns the number of subscribers reached
    pub fn emit(&self, event: ViewEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(count) => count,
            Err(_) => {
                trace!("No subscribers for {}", name);
                0
            }
        }
    }

    /// Emits a transient notice
    pub fn notice(&self, level: NoticeLevel, message: impl Into<String>) -> usize {
        self.emit(ViewEvent::Notice(NoticeEvent::new(level, message)))
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
