//! Player Settings
//!
//! Bridge timing, caption and screenshot preferences persisted as JSON in
//! `{config_dir}/settings.json`. Every field has a default and bad values
//! are clamped on load, so a hand-edited file never stops the player.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::bridge::BridgeConfig;
use crate::core::fs::atomic_write_json_pretty;
use crate::core::{CoreResult, ImageFormat};

/// Current settings schema version
pub const SETTINGS_VERSION: u32 = 1;

/// File name inside the config directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Player settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    /// Schema version of the stored file
    #[serde(default = "default_version")]
    pub version: u32,

    /// Player bridge settings
    #[serde(default)]
    pub bridge: BridgeSettings,

    /// Caption settings
    #[serde(default)]
    pub captions: CaptionSettings,

    /// Screenshot settings
    #[serde(default)]
    pub screenshot: ScreenshotSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            bridge: BridgeSettings::default(),
            captions: CaptionSettings::default(),
            screenshot: ScreenshotSettings::default(),
        }
    }
}

impl PlayerSettings {
    /// Clamps every value into its accepted range and stamps the current
    /// schema version.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.bridge.max_attempts = self.bridge.max_attempts.clamp(1, 10);
        self.bridge.retry_delay_ms = self.bridge.retry_delay_ms.clamp(10, 60_000);
        self.bridge.media_poll_interval_ms = self.bridge.media_poll_interval_ms.clamp(10, 5_000);

        self.captions.default_language = self.captions.default_language.trim().to_string();
        if self.captions.default_language.is_empty() {
            self.captions.default_language = default_language();
        }

        self.screenshot.format = normalize_enum(
            &self.screenshot.format,
            &["png", "jpeg", "webp"],
            default_screenshot_format(),
        );
        self.screenshot.quality = clamp_f64(self.screenshot.quality, 0.0, 1.0);
    }

    /// Bridge configuration derived from these settings
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig::default()
            .with_max_attempts(self.bridge.max_attempts)
            .with_retry_delay(Duration::from_millis(self.bridge.retry_delay_ms))
            .with_media_poll_interval(Duration::from_millis(self.bridge.media_poll_interval_ms))
    }

    /// Screenshot image format
    pub fn screenshot_format(&self) -> ImageFormat {
        ImageFormat::parse(&self.screenshot.format).unwrap_or_default()
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    let lower = value.trim().to_ascii_lowercase();
    if allowed.contains(&lower.as_str()) {
        lower
    } else {
        fallback
    }
}

/// Player bridge settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeSettings {
    /// Total handshake attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between handshake attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Polling interval while waiting for the media element, in milliseconds
    #[serde(default = "default_media_poll_interval_ms")]
    pub media_poll_interval_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            media_poll_interval_ms: default_media_poll_interval_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_media_poll_interval_ms() -> u64 {
    100
}

/// Caption settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSettings {
    /// Show captions when available
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Preferred caption language code
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_language: default_language(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

/// Screenshot settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotSettings {
    /// Encoded image format ("png", "jpeg", "webp")
    #[serde(default = "default_screenshot_format")]
    pub format: String,
    /// Encoder quality between 0 and 1 (ignored for png)
    #[serde(default = "default_screenshot_quality")]
    pub quality: f64,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            format: default_screenshot_format(),
            quality: default_screenshot_quality(),
        }
    }
}

fn default_screenshot_format() -> String {
    "png".to_string()
}

fn default_screenshot_quality() -> f64 {
    0.92
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Loads and saves [`PlayerSettings`] in a config directory
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Creates a manager for `{config_dir}/settings.json`
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    /// Creates a manager for an explicit settings file
    pub fn with_path(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Path of the backing file
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk, falling back to defaults
    pub fn load(&self) -> PlayerSettings {
        if !self.settings_path.exists() {
            info!("No settings at {}, using defaults", self.settings_path.display());
            return PlayerSettings::default();
        }

        let result = fs::read_to_string(&self.settings_path)
            .map_err(|e| format!("Failed to read settings file: {}", e))
            .and_then(|content| {
                serde_json::from_str::<PlayerSettings>(&content)
                    .map_err(|e| format!("Failed to parse settings file: {}", e))
            });

        match result {
            Ok(mut settings) => {
                if settings.version < SETTINGS_VERSION {
                    info!(
                        "Upgrading settings schema {} -> {}",
                        settings.version, SETTINGS_VERSION
                    );
                }
                settings.normalize();
                settings
            }
            Err(e) => {
                warn!("Ignoring unreadable settings {}: {}", self.settings_path.display(), e);
                PlayerSettings::default()
            }
        }
    }

    /// Normalizes and persists `settings`, returning what was written
    pub fn save(&self, settings: &PlayerSettings) -> CoreResult<PlayerSettings> {
        let mut normalized = settings.clone();
        normalized.normalize();

        atomic_write_json_pretty(&self.settings_path, &normalized)?;

        info!("Saved player settings to {}", self.settings_path.display());
        Ok(normalized)
    }

    /// Removes the stored file and returns the defaults
    pub fn reset(&self) -> CoreResult<PlayerSettings> {
        if self.settings_path.exists() {
            fs::remove_file(&self.settings_path)?;
            info!("Removed {}", self.settings_path.display());
        }
        Ok(PlayerSettings::default())
    }
}
