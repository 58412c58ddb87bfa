//! Highlight Context
//!
//! The host-controlled "active collection" color that gates drag selection.
//! Cloned handles share the same value.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Highlight color of the active collection (any CSS color string)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightColor(pub String);

impl HighlightColor {
    pub fn new(color: impl Into<String>) -> Self {
        Self(color.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shared, host-updated highlight configuration.
///
/// An empty context means no collection is active and selection is disabled.
#[derive(Clone, Debug, Default)]
pub struct HighlightContext {
    color: Arc<RwLock<Option<HighlightColor>>>,
}

impl HighlightContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context with an active color
    pub fn with_color(color: HighlightColor) -> Self {
        let context = Self::new();
        context.set_color(color);
        context
    }

    /// Activates `color`
    pub fn set_color(&self, color: HighlightColor) {
        *self.color.write().unwrap_or_else(PoisonError::into_inner) = Some(color);
    }

    /// Deactivates selection
    pub fn clear(&self) {
        *self.color.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Current color, if a collection is active
    pub fn color(&self) -> Option<HighlightColor> {
        self.color
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.color().is_some()
    }
}
