//! Host collaborator seams
//!
//! Narrow interfaces onto the surrounding application: caption lookup,
//! source resolution and attachment storage.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::captions::{parse_srt, Cue, TrackInfo};
use crate::core::fs::{atomic_write_bytes, validate_attachment_name};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Traits
// =============================================================================

/// Looks up captions for a media locator
pub trait CaptionSource: Send + Sync {
    /// Cues for `locator`, or `None` when the media has no captions
    fn load_captions(&self, locator: &str) -> Option<Vec<Cue>>;

    /// Caption tracks known for `locator`
    fn tracks(&self, _locator: &str) -> Vec<TrackInfo> {
        Vec::new()
    }
}

/// A source reference resolved to something the player can load
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSource {
    pub playable_url: String,
    /// Local file backing the source, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// Turns a raw source reference into a playable URL
pub trait SourceResolver: Send + Sync {
    fn resolve_source(&self, raw: &str) -> CoreResult<ResolvedSource>;
}

/// Persists binary attachments, returning where they were stored
pub trait AttachmentStore: Send + Sync {
    fn save_attachment(&self, name: &str, bytes: &[u8]) -> CoreResult<PathBuf>;
}

// =============================================================================
// Filesystem Implementations
// =============================================================================

/// Reads the `.srt` file sitting next to a local media file
#[derive(Clone, Debug, Default)]
pub struct SidecarSrtSource;

impl SidecarSrtSource {
    /// `movie.mp4` -> `movie.srt`
    pub fn sidecar_path(locator: &str) -> PathBuf {
        Path::new(locator).with_extension("srt")
    }
}

impl CaptionSource for SidecarSrtSource {
    fn load_captions(&self, locator: &str) -> Option<Vec<Cue>> {
        let path = Self::sidecar_path(locator);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let cues = parse_srt(&content);
                debug!("Loaded {} cues from {}", cues.len(), path.display());
                Some(cues)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read captions {}: {}", path.display(), e);
                None
            }
        }
    }

    fn tracks(&self, locator: &str) -> Vec<TrackInfo> {
        let path = Self::sidecar_path(locator);
        if !path.is_file() {
            return Vec::new();
        }
        vec![TrackInfo {
            id: path.display().to_string(),
            language_code: String::new(),
            language_name: "Sidecar".to_string(),
            generated: false,
            url: None,
        }]
    }
}

/// Resolves plain file paths and passes URLs through
#[derive(Clone, Debug, Default)]
pub struct LocalFileResolver;

impl SourceResolver for LocalFileResolver {
    fn resolve_source(&self, raw: &str) -> CoreResult<ResolvedSource> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CoreError::NoMediaOpen);
        }

        if raw.contains("://") {
            return Ok(ResolvedSource {
                playable_url: raw.to_string(),
                local_path: None,
            });
        }

        let path = PathBuf::from(raw);
        let absolute = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };

        Ok(ResolvedSource {
            playable_url: format!("file://{}", absolute.display()),
            local_path: Some(absolute),
        })
    }
}

/// Stores attachments as files in one directory
#[derive(Clone, Debug)]
pub struct FsAttachmentStore {
    dir: PathBuf,
}

impl FsAttachmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AttachmentStore for FsAttachmentStore {
    fn save_attachment(&self, name: &str, bytes: &[u8]) -> CoreResult<PathBuf> {
        validate_attachment_name(name)?;

        let path = self.dir.join(name.trim());
        atomic_write_bytes(&path, bytes)
            .map_err(|e| CoreError::AttachmentFailed(format!("{}: {}", path.display(), e)))?;

        info!("Saved attachment {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_source_reads_srt() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("talk.mp4");
        fs::write(
            dir.path().join("talk.srt"),
            "1\n00:00:01,000 --> 00:00:02,000\nHello\n",
        )
        .unwrap();

        let source = SidecarSrtSource;
        let cues = source.load_captions(media.to_str().unwrap()).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Hello");
        assert_eq!(source.tracks(media.to_str().unwrap()).len(), 1);
    }

    #[test]
    fn test_sidecar_source_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("silent.mp4");

        let source = SidecarSrtSource;
        assert!(source.load_captions(media.to_str().unwrap()).is_none());
        assert!(source.tracks(media.to_str().unwrap()).is_empty());
    }

    #[test]
    fn test_resolver_passes_urls_through() {
        let resolved = LocalFileResolver
            .resolve_source("https://example.com/a.mp4")
            .unwrap();
        assert_eq!(resolved.playable_url, "https://example.com/a.mp4");
        assert_eq!(resolved.local_path, None);
    }

    #[test]
    fn test_resolver_makes_local_paths_absolute() {
        let resolved = LocalFileResolver.resolve_source("/media/a.mp4").unwrap();
        assert_eq!(resolved.playable_url, "file:///media/a.mp4");
        assert_eq!(resolved.local_path, Some(PathBuf::from("/media/a.mp4")));

        assert_eq!(
            LocalFileResolver.resolve_source("  "),
            Err(CoreError::NoMediaOpen)
        );
    }

    #[test]
    fn test_fs_store_writes_attachment() {
        let dir = TempDir::new().unwrap();
        let store = FsAttachmentStore::new(dir.path().join("attachments"));

        let path = store.save_attachment("frame.png", b"png-bytes").unwrap();
        assert_eq!(path, dir.path().join("attachments").join("frame.png"));
        assert_eq!(fs::read(&path).unwrap(), b"png-bytes");
    }

    #[test]
    fn test_fs_store_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FsAttachmentStore::new(dir.path());

        let result = store.save_attachment("../escape.png", b"x");
        assert!(matches!(result, Err(CoreError::AttachmentFailed(_))));
        assert!(!dir.path().parent().unwrap().join("escape.png").exists());
    }
}
