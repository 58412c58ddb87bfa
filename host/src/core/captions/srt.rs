//! SubRip Parser
//!
//! Tolerant line-oriented parser turning raw SRT text into cues.
//! Unparseable regions are skipped rather than reported; the caller only
//! ever observes fewer cues.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! First caption text
//!
//! 00:00:05,500 --> 00:00:08,000     <- index line may be missing
//! Second caption text
//! with multiple lines
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::timestamp::parse_timestamp;
use super::Cue;
use crate::core::TimeSec;

/// Marker that identifies a timing line
const TIMING_ARROW: &str = "-->";

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+:\d{2}:\d{2}[.,]\d{3})\s*-->\s*(\d+:\d{2}:\d{2}[.,]\d{3})")
        .expect("SRT timing pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekIndex,
    SeekTiming,
    CollectText,
}

/// Parses SRT content into cues in source order.
///
/// Never fails: malformed segments are skipped and whatever cues could be
/// extracted are returned. Cues are not re-sorted.
pub fn parse_srt(content: &str) -> Vec<Cue> {
    let lines: Vec<&str> = content.trim_start_matches('\u{feff}').lines().collect();

    let mut cues = Vec::new();
    let mut state = ParseState::SeekIndex;
    let mut sequence: Option<u32> = None;
    let mut timing: (TimeSec, TimeSec) = (0.0, 0.0);
    let mut text_lines: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim_end();

        match state {
            ParseState::SeekIndex => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    i += 1;
                } else if trimmed.contains(TIMING_ARROW) {
                    // Timing line without a preceding index; reprocess it as timing.
                    sequence = None;
                    state = ParseState::SeekTiming;
                } else if let Ok(n) = trimmed.parse::<u32>() {
                    sequence = Some(n);
                    state = ParseState::SeekTiming;
                    i += 1;
                } else {
                    debug!("Skipping stray SRT line {}: {:?}", i + 1, trimmed);
                    i += 1;
                }
            }
            ParseState::SeekTiming => {
                if let Some(parsed) = parse_timing_line(line) {
                    timing = parsed;
                    text_lines.clear();
                    state = ParseState::CollectText;
                } else {
                    debug!("Skipping malformed SRT timing line {}: {:?}", i + 1, line);
                    sequence = None;
                    state = ParseState::SeekIndex;
                }
                i += 1;
            }
            ParseState::CollectText => {
                if line.trim().is_empty() {
                    cues.push(build_cue(timing, &text_lines, sequence.take()));
                    state = ParseState::SeekIndex;
                } else {
                    text_lines.push(line);
                }
                i += 1;
            }
        }
    }

    if state == ParseState::CollectText {
        cues.push(build_cue(timing, &text_lines, sequence.take()));
    }

    cues
}

/// Parses a timing line (e.g., "00:00:01,000 --> 00:00:04,000")
fn parse_timing_line(line: &str) -> Option<(TimeSec, TimeSec)> {
    let caps = TIMING_LINE.captures(line)?;
    let start = parse_timestamp(caps.get(1)?.as_str());
    let end = parse_timestamp(caps.get(2)?.as_str());

    if start.is_nan() || end.is_nan() {
        return None;
    }
    Some((start, end))
}

fn build_cue(timing: (TimeSec, TimeSec), text_lines: &[&str], sequence: Option<u32>) -> Cue {
    Cue {
        start: timing.0,
        end: timing.1,
        text: text_lines.join("\n"),
        sequence_number: sequence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Well-formed Input
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_srt_basic() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:02,500 --> 00:00:03,000\nWorld\n";

        let cues = parse_srt(srt);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], Cue::new(1.0, 2.0, "Hello").with_sequence(1));
        assert_eq!(cues[1], Cue::new(2.5, 3.0, "World").with_sequence(2));
    }

    #[test]
    fn test_parse_srt_multiline_text() {
        let srt = "1\n00:00:00,000 --> 00:00:05,000\nLine one\nLine two\nLine three\n";

        let cues = parse_srt(srt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Line one\nLine two\nLine three");
    }

    #[test]
    fn test_parse_srt_crlf_and_bom() {
        let srt = "\u{feff}1\r\n00:00:01.000 --> 00:00:02.000\r\nHi\r\n\r\n";

        let cues = parse_srt(srt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Hi");
        assert_eq!(cues[0].start, 1.0);
    }

    #[test]
    fn test_parse_srt_keeps_source_order() {
        let srt = "1\n00:00:05,000 --> 00:00:06,000\nLater\n\n2\n00:00:01,000 --> 00:00:02,000\nEarlier\n";

        let cues = parse_srt(srt);
        assert_eq!(cues[0].text, "Later");
        assert_eq!(cues[1].text, "Earlier");
    }

    // -------------------------------------------------------------------------
    // Malformed Input
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_srt_missing_index_lines() {
        let srt = "00:00:01,000 --> 00:00:02,000\nNo index\n\n00:00:03,000 --> 00:00:04,000\nStill none\n";

        let cues = parse_srt(srt);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].sequence_number, None);
        assert_eq!(cues[1].text, "Still none");
    }

    #[test]
    fn test_parse_srt_skips_bad_timing() {
        let srt = "1\n00:00:invalid --> 00:00:04,000\nHello\n\n2\n00:00:05,000 --> 00:00:06,000\nGood\n";

        let cues = parse_srt(srt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Good");
        assert_eq!(cues[0].sequence_number, Some(2));
    }

    #[test]
    fn test_parse_srt_empty_and_garbage() {
        assert!(parse_srt("").is_empty());
        assert!(parse_srt("\n\n\n").is_empty());
        assert!(parse_srt("just some words\nand more").is_empty());
    }

    #[test]
    fn test_parse_srt_text_at_end_of_input() {
        let srt = "7\n00:01:00,000 --> 00:01:02,500\nlast line";

        let cues = parse_srt(srt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].end, 62.5);
        assert_eq!(cues[0].sequence_number, Some(7));
    }
}
