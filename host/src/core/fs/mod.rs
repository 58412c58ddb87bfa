//! Attachment and settings file helpers
//!
//! Crash-tolerant writes for settings and captured attachments, plus name
//! validation for files created from remote-supplied data.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Name Validation
// =============================================================================

/// Validates that an attachment file name is a single safe path component.
///
/// Rejects empty names, traversal sequences (`..`), path separators,
/// drive letter indicators and control characters.
pub fn validate_attachment_name(name: &str) -> CoreResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::AttachmentFailed(
            "attachment name is empty".to_string(),
        ));
    }
    if trimmed.contains("..") || trimmed.contains(['/', '\\', ':']) {
        return Err(CoreError::AttachmentFailed(format!(
            "attachment name contains path characters: {trimmed}"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(CoreError::AttachmentFailed(format!(
            "attachment name contains control characters: {trimmed:?}"
        )));
    }
    Ok(())
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Writes `bytes` to `path` so readers see either the old or the new
/// content, never a partial file.
///
/// The data lands in `<name>.tmp` first, is synced, then renamed over the
/// target (an existing target is parked as `<name>.bak` during the swap).
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let staged = sibling_path(path, "tmp");
    {
        let mut out = BufWriter::new(File::create(&staged)?);
        out.write_all(bytes)?;
        out.flush()?;
        out.get_ref().sync_all()?;
    }

    swap_into_place(&staged, path)
}

/// Pretty-printed JSON variant of [`atomic_write_bytes`]
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    atomic_write_bytes(path, &serde_json::to_vec_pretty(value)?)
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_file_name(format!("{file_name}.{suffix}"));
    sibling
}

fn swap_into_place(staged: &Path, target: &Path) -> CoreResult<()> {
    if !target.exists() {
        std::fs::rename(staged, target)?;
        return Ok(());
    }

    // Renaming over an existing file fails on some platforms.
    let parked = sibling_path(target, "bak");
    if parked.exists() {
        std::fs::remove_file(&parked)?;
    }
    std::fs::rename(target, &parked)?;

    if let Err(e) = std::fs::rename(staged, target) {
        let _ = std::fs::rename(&parked, target);
        let _ = std::fs::remove_file(staged);
        return Err(e.into());
    }
    let _ = std::fs::remove_file(&parked);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_overwrites_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("frame.png");

        atomic_write_bytes(&path, b"first frame").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first frame");

        atomic_write_bytes(&path, b"second frame").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second frame");
        assert!(!sibling_path(&path, "tmp").exists());
        assert!(!sibling_path(&path, "bak").exists());
    }

    #[test]
    fn test_validate_attachment_name() {
        assert!(validate_attachment_name("clip-00_00_01_500.png").is_ok());
        assert!(validate_attachment_name("").is_err());
        assert!(validate_attachment_name("   ").is_err());
        assert!(validate_attachment_name("../escape.png").is_err());
        assert!(validate_attachment_name("dir/file.png").is_err());
        assert!(validate_attachment_name("C:file.png").is_err());
        assert!(validate_attachment_name("bad\u{0}name").is_err());
    }
}
