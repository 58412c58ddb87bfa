//! Token Selection
//!
//! Lets the user drag across the word tokens of a displayed caption line and
//! merge the contiguous run into one annotated unit.
//!
//! - `line.rs`    - node model of a rendered caption line
//! - `context.rs` - host-controlled highlight color gating selection
//! - `engine.rs`  - pointer-driven drag/merge state machine

mod context;
mod engine;
mod line;

pub use context::{HighlightColor, HighlightContext};
pub use engine::SelectionEngine;
pub use line::{CaptionLine, LineNode, MergedUnit, WordToken};
