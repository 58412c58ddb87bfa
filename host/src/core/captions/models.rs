//! Caption Data Models
//!
//! Defines the timed cue, the transcript line consumed by the formatter,
//! and descriptive caption track metadata.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::TimeSec;

// =============================================================================
// Cue
// =============================================================================

/// One timed subtitle entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    /// Start time in seconds
    pub start: TimeSec,
    /// End time in seconds (inclusive)
    pub end: TimeSec,
    /// Caption text, lines separated by `\n`
    pub text: String,
    /// Sequence number from the source file, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,
}

impl Cue {
    /// Creates a cue without a sequence number
    pub fn new(start: TimeSec, end: TimeSec, text: &str) -> Self {
        Self {
            start,
            end,
            text: text.to_string(),
            sequence_number: None,
        }
    }

    /// Sets the sequence number
    pub fn with_sequence(mut self, sequence_number: u32) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    /// Duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end - self.start
    }

    /// Whether `time` falls inside `[start, end]`
    pub fn contains(&self, time: TimeSec) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Validates cues at ingestion.
///
/// Cues with a non-finite bound are dropped; cues whose end precedes their
/// start are clamped to a zero-length interval at `start`. Order is kept.
pub fn sanitize_cues(cues: Vec<Cue>) -> Vec<Cue> {
    cues.into_iter()
        .filter_map(|mut cue| {
            if !cue.start.is_finite() || !cue.end.is_finite() {
                warn!(
                    "Dropping cue with non-finite bounds: {}~{} {:?}",
                    cue.start, cue.end, cue.text
                );
                return None;
            }
            if cue.end < cue.start {
                warn!(
                    "Clamping cue end {:.3} to start {:.3}: {:?}",
                    cue.end, cue.start, cue.text
                );
                cue.end = cue.start;
            }
            Some(cue)
        })
        .collect()
}

// =============================================================================
// Transcript Line
// =============================================================================

/// A transcript line used as caption formatter input
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLine {
    /// Line text
    pub text: String,
    /// Start time in seconds
    pub start: TimeSec,
    /// Duration in seconds
    pub duration: TimeSec,
}

impl TranscriptLine {
    /// Creates a new transcript line
    pub fn new(text: &str, start: TimeSec, duration: TimeSec) -> Self {
        Self {
            text: text.to_string(),
            start,
            duration,
        }
    }

    /// Unclipped end time
    pub fn end(&self) -> TimeSec {
        self.start + self.duration
    }
}

// =============================================================================
// Track Info
// =============================================================================

/// Descriptive metadata for an available caption track.
///
/// Passed through to the host untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    /// Track identifier
    pub id: String,
    /// Language code (e.g., "en")
    pub language_code: String,
    /// Human readable language name
    pub language_name: String,
    /// Whether the track was machine generated
    #[serde(default)]
    pub generated: bool,
    /// Source URL, if the track is fetched remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
