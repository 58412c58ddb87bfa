//! Caption System Module
//!
//! Provides the caption pieces consumed by the player view:
//! - Cue data models (Cue, TranscriptLine, TrackInfo)
//! - Timestamp parsing and formatting
//! - Tolerant SRT parsing and SRT export
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - Data structures (Cue, TranscriptLine, Track)   │
//! │  timestamp.rs  - hh:mm:ss[.,]mmm codec                          │
//! │  srt.rs        - SRT parsing                                    │
//! │  formats.rs    - Transcript export (SRT)                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod formats;
mod models;
mod srt;
pub mod timestamp;

pub use formats::{export_srt, format_transcript, CaptionFormat};
pub use models::{sanitize_cues, Cue, TrackInfo, TranscriptLine};
pub use srt::parse_srt;
pub use timestamp::{format_srt_timestamp, format_timestamp, format_vtt_timestamp, parse_timestamp};
