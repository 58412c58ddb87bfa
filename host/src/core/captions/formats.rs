//! Caption Format Exporters
//!
//! Renders transcript lines into an output subtitle format.
//! Only SRT (SubRip) output is supported.
//!
//! # Example
//!
//! ```rust,ignore
//! use lockstep_lib::core::captions::{format_transcript, TranscriptLine};
//!
//! let lines = vec![TranscriptLine::new("Hello", 0.0, 5.0)];
//! let srt = format_transcript(&lines, "srt")?;
//! ```

use super::timestamp::format_srt_timestamp;
use super::TranscriptLine;
use crate::core::{CoreError, CoreResult, TimeSec};

/// Output subtitle formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptionFormat {
    /// SubRip
    Srt,
}

impl CaptionFormat {
    /// Resolves a format name, case-insensitively
    pub fn parse(name: &str) -> CoreResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            other => Err(CoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Formats transcript lines into `target_format`.
///
/// Fails with [`CoreError::UnsupportedFormat`] for anything but `srt`.
pub fn format_transcript(lines: &[TranscriptLine], target_format: &str) -> CoreResult<String> {
    match CaptionFormat::parse(target_format)? {
        CaptionFormat::Srt => Ok(export_srt(lines)),
    }
}

/// Exports transcript lines to SRT.
///
/// Blocks are numbered 1..N regardless of input. Each end time is
/// `start + duration`, clamped to the next line's start when they overlap.
pub fn export_srt(lines: &[TranscriptLine]) -> String {
    let mut output = String::new();

    for (index, line) in lines.iter().enumerate() {
        let end = clipped_end(line, lines.get(index + 1));

        output.push_str(&format!("{}\n", index + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(line.start),
            format_srt_timestamp(end)
        ));
        output.push_str(&line.text);
        output.push_str("\n\n");
    }

    output
}

fn clipped_end(line: &TranscriptLine, next: Option<&TranscriptLine>) -> TimeSec {
    let end = line.end();
    match next {
        Some(next) if next.start < end => next.start,
        _ => end,
    }
}
