//! Token Selection Engine
//!
//! Drag selection over the word tokens of one rendered caption line.
//! Pointer-down anchors the drag, pointer-move recomputes the inclusive
//! anchor..current range in DOM order, and pointer-up merges the run into a
//! single annotated unit and emits [`ViewEvent::SelectionCompleted`].

use std::collections::BTreeSet;

use tracing::debug;

use super::{CaptionLine, HighlightColor, HighlightContext};
use crate::core::{MediaLocator, TokenIndex};
use crate::ipc::{EventEmitter, SelectionEvent, ViewEvent};

/// Per-gesture selection state
#[derive(Debug, Default)]
struct SelectionState {
    anchor: Option<TokenIndex>,
    /// Selected tokens; iteration order is DOM order
    selected: BTreeSet<TokenIndex>,
    /// Color captured at pointer-down
    color: Option<HighlightColor>,
    /// Pointer input is captured by the engine
    capturing: bool,
}

/// Drag-selection state machine bound to one caption view
#[derive(Debug)]
pub struct SelectionEngine {
    highlight: HighlightContext,
    locator: MediaLocator,
    events: EventEmitter,
    state: SelectionState,
}

impl SelectionEngine {
    /// Creates an engine reading the active color from `highlight` and
    /// tagging completed selections with `locator`
    pub fn new(highlight: HighlightContext, locator: MediaLocator, events: EventEmitter) -> Self {
        Self {
            highlight,
            locator,
            events,
            state: SelectionState::default(),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Whether a drag gesture is in progress
    pub fn is_dragging(&self) -> bool {
        self.state.capturing
    }

    pub fn anchor(&self) -> Option<TokenIndex> {
        self.state.anchor
    }

    /// Selected tokens in DOM order
    pub fn selected(&self) -> Vec<TokenIndex> {
        self.state.selected.iter().copied().collect()
    }

    /// Starts a drag at the node under the pointer.
    ///
    /// No-op (returns `false`) without an active highlight color or when the
    /// node is not a selectable token.
    pub fn pointer_down(&mut self, line: &mut CaptionLine, position: usize) -> bool {
        let Some(color) = self.highlight.color() else {
            return false;
        };
        let Some(token) = line.hit_test(position) else {
            return false;
        };

        line.clear_highlights();
        self.state = SelectionState {
            anchor: Some(token),
            selected: BTreeSet::from([token]),
            color: Some(color),
            capturing: true,
        };
        line.set_highlight(token, true);
        true
    }

    /// Extends or shrinks the range to the token under the pointer.
    ///
    /// Returns `true` when the highlighted range changed.
    pub fn pointer_move(&mut self, line: &mut CaptionLine, position: Option<usize>) -> bool {
        if !self.state.capturing {
            return false;
        }
        let Some(anchor) = self.state.anchor else {
            return false;
        };
        let Some(current) = position.and_then(|pos| line.hit_test(pos)) else {
            return false;
        };

        let run = line.selectable_run(anchor);
        let Some(anchor_idx) = run.iter().position(|&t| t == anchor) else {
            return false;
        };
        let current_idx = match run.iter().position(|&t| t == current) {
            Some(idx) => idx,
            // Beyond a merged unit: clamp to the edge of the anchor's run.
            None if current < anchor => 0,
            None => run.len() - 1,
        };

        let (low, high) = if anchor_idx <= current_idx {
            (anchor_idx, current_idx)
        } else {
            (current_idx, anchor_idx)
        };
        let next: BTreeSet<TokenIndex> = run[low..=high].iter().copied().collect();
        if next == self.state.selected {
            return false;
        }

        for &token in self.state.selected.difference(&next) {
            line.set_highlight(token, false);
        }
        for &token in next.difference(&self.state.selected) {
            line.set_highlight(token, true);
        }
        self.state.selected = next;
        true
    }

    /// Ends the gesture, merging a non-empty selection.
    ///
    /// Selection state is cleared whether or not a merge happened.
    pub fn pointer_up(&mut self, line: &mut CaptionLine) -> Option<SelectionEvent> {
        let event = if self.state.capturing {
            self.merge(line)
        } else {
            None
        };
        self.reset();
        event
    }

    /// Abandons the gesture and removes its highlight
    pub fn cancel(&mut self, line: &mut CaptionLine) {
        for &token in &self.state.selected {
            line.set_highlight(token, false);
        }
        self.reset();
    }

    /// Drops gesture state without touching any line
    pub fn reset(&mut self) {
        self.state = SelectionState::default();
    }

    fn merge(&mut self, line: &mut CaptionLine) -> Option<SelectionEvent> {
        if self.state.selected.is_empty() {
            return None;
        }
        let color = self.state.color.clone()?;
        let tokens: Vec<TokenIndex> = self.state.selected.iter().copied().collect();

        let unit = line.merge(&tokens, color)?;
        debug!(
            "Merged tokens {}..={} on line {}: {:?}",
            unit.start, unit.end, unit.line, unit.text
        );

        let event = SelectionEvent {
            text: unit.text,
            line: unit.line,
            start: unit.start,
            end: unit.end,
            locator: self.locator.clone(),
            time: line.time(),
        };
        self.events
            .emit(ViewEvent::SelectionCompleted(event.clone()));
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::captions::Cue;

    const WORDS: &str = "zero one two three four five six";

    fn setup() -> (SelectionEngine, CaptionLine, HighlightContext, EventEmitter) {
        let context = HighlightContext::with_color(HighlightColor::new("#ffd400"));
        let events = EventEmitter::default();
        let engine = SelectionEngine::new(context.clone(), "talk.mp4".to_string(), events.clone());
        let line = CaptionLine::from_cue(2, &Cue::new(30.0, 34.0, WORDS).with_sequence(3));
        (engine, line, context, events)
    }

    fn at(line: &CaptionLine, token: TokenIndex) -> usize {
        line.position_of(token).unwrap()
    }

    fn down(engine: &mut SelectionEngine, line: &mut CaptionLine, token: TokenIndex) -> bool {
        let pos = at(line, token);
        engine.pointer_down(line, pos)
    }

    fn drag(engine: &mut SelectionEngine, line: &mut CaptionLine, token: TokenIndex) -> bool {
        let pos = at(line, token);
        engine.pointer_move(line, Some(pos))
    }

    // -------------------------------------------------------------------------
    // Drag Range
    // -------------------------------------------------------------------------

    #[test]
    fn test_forward_drag_is_inclusive() {
        let (mut engine, mut line, _, _) = setup();

        assert!(down(&mut engine, &mut line, 2));
        assert!(drag(&mut engine, &mut line, 5));

        assert_eq!(engine.selected(), vec![2, 3, 4, 5]);
        assert_eq!(line.highlighted(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_backward_drag_is_inclusive() {
        let (mut engine, mut line, _, _) = setup();

        down(&mut engine, &mut line, 5);
        drag(&mut engine, &mut line, 2);

        assert_eq!(engine.selected(), vec![2, 3, 4, 5]);
        assert_eq!(line.highlighted(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_shrinking_removes_highlight() {
        let (mut engine, mut line, _, _) = setup();

        down(&mut engine, &mut line, 4);
        drag(&mut engine, &mut line, 2);
        assert_eq!(line.highlighted(), vec![2, 3, 4]);

        assert!(drag(&mut engine, &mut line, 3));
        assert_eq!(engine.selected(), vec![3, 4]);
        assert_eq!(line.highlighted(), vec![3, 4]);
        assert!(!line.word(2).unwrap().highlighted);
    }

    #[test]
    fn test_drag_across_anchor_flips_direction() {
        let (mut engine, mut line, _, _) = setup();

        down(&mut engine, &mut line, 3);
        drag(&mut engine, &mut line, 5);
        drag(&mut engine, &mut line, 1);

        assert_eq!(line.highlighted(), vec![1, 2, 3]);
    }

    #[test]
    fn test_move_over_whitespace_keeps_range() {
        let (mut engine, mut line, _, _) = setup();

        down(&mut engine, &mut line, 1);
        drag(&mut engine, &mut line, 3);
        let space = at(&line, 3) + 1;
        assert!(!engine.pointer_move(&mut line, Some(space)));
        assert!(!engine.pointer_move(&mut line, None));

        assert_eq!(engine.selected(), vec![1, 2, 3]);
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let (mut engine, mut line, _, _) = setup();
        let pos = at(&line, 3);
        assert!(!engine.pointer_move(&mut line, Some(pos)));
        assert!(line.highlighted().is_empty());
    }

    // -------------------------------------------------------------------------
    // Activation
    // -------------------------------------------------------------------------

    #[test]
    fn test_no_active_color_disables_selection() {
        let (mut engine, mut line, context, _) = setup();
        context.clear();

        assert!(!down(&mut engine, &mut line, 1));
        assert!(!engine.is_dragging());
        assert!(engine.pointer_up(&mut line).is_none());
        assert!(line.merged_units().is_empty());
    }

    #[test]
    fn test_pointer_down_on_whitespace_is_noop() {
        let (mut engine, mut line, _, _) = setup();
        let space = at(&line, 0) + 1;
        assert!(!engine.pointer_down(&mut line, space));
        assert!(!engine.is_dragging());
    }

    // -------------------------------------------------------------------------
    // Merge
    // -------------------------------------------------------------------------

    #[test]
    fn test_pointer_up_merges_and_emits() {
        let (mut engine, mut line, _, events) = setup();
        let mut rx = events.subscribe();

        down(&mut engine, &mut line, 5);
        drag(&mut engine, &mut line, 2);
        let event = engine.pointer_up(&mut line).unwrap();

        let expected = SelectionEvent {
            text: "two three four five".to_string(),
            line: 3,
            start: 2,
            end: 5,
            locator: "talk.mp4".to_string(),
            time: 30.0,
        };
        assert_eq!(event, expected);
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::SelectionCompleted(expected));

        let units = line.merged_units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].color, HighlightColor::new("#ffd400"));
        assert_eq!(line.text(), WORDS);

        assert!(!engine.is_dragging());
        assert!(engine.selected().is_empty());
        assert!(engine.anchor().is_none());
    }

    #[test]
    fn test_single_token_merge_keeps_text() {
        let (mut engine, mut line, _, _) = setup();

        down(&mut engine, &mut line, 6);
        let event = engine.pointer_up(&mut line).unwrap();

        assert_eq!(event.text, "six");
        assert_eq!((event.start, event.end), (6, 6));
    }

    #[test]
    fn test_pointer_up_without_selection_is_noop() {
        let (mut engine, mut line, _, events) = setup();
        let mut rx = events.subscribe();

        assert!(engine.pointer_up(&mut line).is_none());
        assert!(rx.try_recv().is_err());
        assert!(line.merged_units().is_empty());
    }

    #[test]
    fn test_merged_units_are_terminal() {
        let (mut engine, mut line, _, _) = setup();

        down(&mut engine, &mut line, 2);
        drag(&mut engine, &mut line, 3);
        engine.pointer_up(&mut line).unwrap();

        let merged_pos = line
            .nodes()
            .iter()
            .position(|n| matches!(n, super::super::LineNode::Merged(_)))
            .unwrap();
        assert!(!engine.pointer_down(&mut line, merged_pos));

        // A new drag from the left is clamped before the merged unit.
        down(&mut engine, &mut line, 0);
        drag(&mut engine, &mut line, 5);
        assert_eq!(engine.selected(), vec![0, 1]);

        let event = engine.pointer_up(&mut line).unwrap();
        assert_eq!(event.text, "zero one");
        assert_eq!(line.merged_units().len(), 2);
    }

    #[test]
    fn test_color_change_mid_drag_uses_pointer_down_color() {
        let (mut engine, mut line, context, _) = setup();

        down(&mut engine, &mut line, 1);
        context.set_color(HighlightColor::new("green"));
        engine.pointer_up(&mut line).unwrap();

        assert_eq!(line.merged_units()[0].color, HighlightColor::new("#ffd400"));
    }

    #[test]
    fn test_cancel_clears_highlight() {
        let (mut engine, mut line, _, _) = setup();

        down(&mut engine, &mut line, 1);
        drag(&mut engine, &mut line, 4);
        engine.cancel(&mut line);

        assert!(line.highlighted().is_empty());
        assert!(!engine.is_dragging());
        assert!(line.merged_units().is_empty());
    }
}
