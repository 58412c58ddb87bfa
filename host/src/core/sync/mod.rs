//! Caption Synchronizer
//!
//! Maps playback-time samples to the active cue and drives a render target.
//! Cues are sorted once at construction; each update is a binary search and
//! the target is touched only when the active cue actually changes.

use tracing::debug;

use crate::core::captions::{sanitize_cues, Cue};
use crate::core::TimeSec;

/// Render target driven by the synchronizer
pub trait CaptionRenderer {
    /// Displays `cue`, which sits at `index` in the sorted cue list
    fn render(&mut self, index: usize, cue: &Cue);

    /// Removes whatever caption is displayed
    fn clear(&mut self);
}

/// Finds the cue whose inclusive `[start, end]` interval contains `time`.
///
/// `cues` must be sorted by start. With overlapping cues the result is
/// whichever containing cue the search reaches first.
pub fn find_cue_index(cues: &[Cue], time: TimeSec) -> Option<usize> {
    if time.is_nan() {
        return None;
    }

    let mut low = 0usize;
    let mut high = cues.len();

    while low < high {
        let mid = low + (high - low) / 2;
        let cue = &cues[mid];
        if time < cue.start {
            high = mid;
        } else if time > cue.end {
            low = mid + 1;
        } else {
            return Some(mid);
        }
    }

    None
}

/// Keeps a render target in lock-step with playback time
pub struct CaptionSynchronizer<R: CaptionRenderer> {
    /// Cues sorted ascending by start (stable)
    cues: Vec<Cue>,
    /// Index of the displayed cue; `None` when nothing is displayed
    current: Option<usize>,
    renderer: R,
}

impl<R: CaptionRenderer> CaptionSynchronizer<R> {
    /// Creates a synchronizer over unordered cues.
    ///
    /// Malformed cues are validated away before the one-time stable sort.
    pub fn new(cues: Vec<Cue>, renderer: R) -> Self {
        let mut cues = sanitize_cues(cues);
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));

        Self {
            cues,
            current: None,
            renderer,
        }
    }

    /// Resolves the cue for `time` and re-renders only on a transition.
    ///
    /// Returns `true` when the render target was touched. Behaviour with
    /// overlapping cues is undefined: any containing cue may be selected.
    pub fn update(&mut self, time: TimeSec) -> bool {
        let resolved = find_cue_index(&self.cues, time);
        if resolved == self.current {
            return false;
        }

        self.current = resolved;
        match resolved {
            Some(index) => {
                debug!("Caption transition to cue {} at {:.3}s", index, time);
                self.renderer.render(index, &self.cues[index]);
            }
            None => {
                debug!("No caption at {:.3}s", time);
                self.renderer.clear();
            }
        }
        true
    }

    /// Forces the no-cue state and clears the render target
    pub fn reset(&mut self) {
        self.current = None;
        self.renderer.clear();
    }

    /// Index of the displayed cue
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The displayed cue
    pub fn current_cue(&self) -> Option<&Cue> {
        self.current.and_then(|index| self.cues.get(index))
    }

    /// Sorted cues
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
