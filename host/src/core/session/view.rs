//! Caption view: the render target the synchronizer drives

use tracing::debug;

use crate::core::captions::Cue;
use crate::core::selection::{CaptionLine, SelectionEngine};
use crate::core::sync::CaptionRenderer;
use crate::ipc::{EventEmitter, LineRenderedEvent, SelectionEvent, ViewEvent};

/// Holds the displayed caption line and routes pointer input to the
/// attached selection engine
#[derive(Debug)]
pub struct CaptionView {
    events: EventEmitter,
    line: Option<CaptionLine>,
    selection: Option<SelectionEngine>,
}

impl CaptionView {
    pub fn new(events: EventEmitter) -> Self {
        Self {
            events,
            line: None,
            selection: None,
        }
    }

    /// Attaches a selection engine; a second attach is ignored.
    ///
    /// Returns `true` when the engine was attached.
    pub fn attach_selection(&mut self, engine: SelectionEngine) -> bool {
        if self.selection.is_some() {
            debug!("Selection engine already attached");
            return false;
        }
        self.selection = Some(engine);
        true
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    /// The displayed line
    pub fn line(&self) -> Option<&CaptionLine> {
        self.line.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.selection.as_ref().is_some_and(SelectionEngine::is_dragging)
    }

    pub fn pointer_down(&mut self, position: usize) -> bool {
        match (self.selection.as_mut(), self.line.as_mut()) {
            (Some(engine), Some(line)) => engine.pointer_down(line, position),
            _ => false,
        }
    }

    pub fn pointer_move(&mut self, position: Option<usize>) -> bool {
        match (self.selection.as_mut(), self.line.as_mut()) {
            (Some(engine), Some(line)) => engine.pointer_move(line, position),
            _ => false,
        }
    }

    pub fn pointer_up(&mut self) -> Option<SelectionEvent> {
        match (self.selection.as_mut(), self.line.as_mut()) {
            (Some(engine), Some(line)) => engine.pointer_up(line),
            _ => None,
        }
    }

    pub fn cancel_selection(&mut self) {
        if let (Some(engine), Some(line)) = (self.selection.as_mut(), self.line.as_mut()) {
            engine.cancel(line);
        }
    }

    fn reset_selection(&mut self) {
        if let Some(engine) = self.selection.as_mut() {
            engine.reset();
        }
    }
}

impl CaptionRenderer for CaptionView {
    fn render(&mut self, index: usize, cue: &Cue) {
        self.reset_selection();

        let line = CaptionLine::from_cue(index, cue);
        self.events.emit(ViewEvent::LineRendered(LineRenderedEvent {
            line: line.line(),
            cue_index: index,
            start: cue.start,
            end: cue.end,
            token_count: line.token_count(),
        }));
        self.line = Some(line);
    }

    fn clear(&mut self) {
        self.reset_selection();
        self.line = None;
        self.events.emit(ViewEvent::CaptionsCleared);
    }
}
