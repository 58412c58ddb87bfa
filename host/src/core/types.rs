//! Lockstep Core Type Definitions
//!
//! Defines fundamental types shared by the caption engine and the player bridge.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Correlation identifier pairing an RPC request with its response (ULID)
pub type CallId = String;

/// Media locator identifying the playing source (path or URL)
pub type MediaLocator = String;

/// Originating caption line number (1-based cue sequence)
pub type LineNumber = u32;

/// Position of a word token within one rendered caption line
pub type TokenIndex = usize;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Generates a fresh correlation id
pub fn new_call_id() -> CallId {
    ulid::Ulid::new().to_string()
}

// =============================================================================
// Image Types
// =============================================================================

/// Encoded image format produced by a frame capture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// MIME type as understood by the media surface
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    /// File extension used for stored attachments
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// Parses a format name or MIME type, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" | "image/png" => Some(Self::Png),
            "jpg" | "jpeg" | "image/jpeg" => Some(Self::Jpeg),
            "webp" | "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_ids_are_unique() {
        let a = new_call_id();
        let b = new_call_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 26);
    }

    #[test]
    fn test_image_format_parse() {
        assert_eq!(ImageFormat::parse("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::parse("image/jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::parse("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::parse("webp"), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::parse("gif"), None);
    }

    #[test]
    fn test_image_format_serde() {
        let json = serde_json::to_string(&ImageFormat::Webp).unwrap();
        assert_eq!(json, "\"webp\"");
    }
}
