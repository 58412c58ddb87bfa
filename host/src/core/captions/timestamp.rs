//! Caption Timestamp Codec
//!
//! Converts between `HH:MM:SS,mmm` / `HH:MM:SS.mmm` timestamps and seconds.

use crate::core::TimeSec;

/// Millisecond separator used by SubRip timestamps
pub const SRT_SEPARATOR: char = ',';

/// Millisecond separator used by WebVTT timestamps
pub const VTT_SEPARATOR: char = '.';

/// Parses a timestamp (e.g., "00:01:23,456" or "00:01:23.456") into seconds.
///
/// No bounds validation is performed: "00:75:00,000" yields 4500 seconds.
/// Malformed input yields `f64::NAN`, which callers are expected to check.
pub fn parse_timestamp(ts: &str) -> TimeSec {
    let normalized = ts.trim().replace(SRT_SEPARATOR, ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    if parts.len() != 3 {
        return f64::NAN;
    }

    let parse = |s: &str| s.parse::<f64>().unwrap_or(f64::NAN);
    let hours = parse(parts[0]);
    let minutes = parse(parts[1]);
    let seconds = parse(parts[2]);

    hours * 3600.0 + minutes * 60.0 + seconds
}

/// Formats seconds as a zero-padded timestamp using `ms_separator`
/// between seconds and milliseconds.
///
/// A fractional part that rounds up to 1000ms is carried into the seconds
/// field, so 59.9996 formats as `00:01:00,000`. Negative or non-finite
/// input formats as zero.
pub fn format_timestamp(seconds: TimeSec, ms_separator: char) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };

    let mut whole = seconds.floor() as u64;
    let mut ms = ((seconds - seconds.floor()) * 1000.0).round() as u64;
    if ms >= 1000 {
        whole += ms / 1000;
        ms %= 1000;
    }

    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, secs, ms_separator, ms
    )
}

/// Formats seconds as an SRT timestamp (00:00:00,000)
pub fn format_srt_timestamp(seconds: TimeSec) -> String {
    format_timestamp(seconds, SRT_SEPARATOR)
}

/// Formats seconds as a VTT timestamp (00:00:00.000)
pub fn format_vtt_timestamp(seconds: TimeSec) -> String {
    format_timestamp(seconds, VTT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:01,500"), 1.5);
        assert_eq!(parse_timestamp("00:01:30,000"), 90.0);
        assert_eq!(parse_timestamp("01:30:00.000"), 5400.0);
        assert!((parse_timestamp("00:00:00,100") - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_parse_timestamp_without_bounds_check() {
        assert_eq!(parse_timestamp("00:75:00,000"), 4500.0);
    }

    #[test]
    fn test_parse_timestamp_malformed_is_nan() {
        assert!(parse_timestamp("garbage").is_nan());
        assert!(parse_timestamp("00:00:xx,000").is_nan());
        assert!(parse_timestamp("00:01,000").is_nan());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(1.5), "00:00:01,500");
        assert_eq!(format_srt_timestamp(90.0), "00:01:30,000");
        assert_eq!(format_vtt_timestamp(5400.25), "01:30:00.250");
        assert_eq!(format_timestamp(3723.004, '.'), "01:02:03.004");
    }

    #[test]
    fn test_format_timestamp_carries_rounded_milliseconds() {
        assert_eq!(format_srt_timestamp(59.9996), "00:01:00,000");
        assert_eq!(format_srt_timestamp(3599.9999), "01:00:00,000");
    }

    #[test]
    fn test_format_timestamp_clamps_invalid_input() {
        assert_eq!(format_srt_timestamp(-4.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(f64::NAN), "00:00:00,000");
    }
}
