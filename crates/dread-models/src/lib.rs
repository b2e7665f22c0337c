//! Shared data models for the DreadReel pipeline.
//!
//! This crate provides pure, I/O-free types for:
//! - Scene scripts and their validation
//! - Scene timing (per-scene duration, total runtime)
//! - Output encoding and subtitle styling
//! - Theme sanitizing for output file names

pub mod encoding;
pub mod script;
pub mod style;
pub mod theme;
pub mod timing;

// Re-export common types
pub use encoding::{OutputEncoding, Resolution};
pub use script::{Scene, SchemaError, Script, ValidationReport};
pub use style::{KenBurns, SubtitleStyle};
pub use theme::{sanitize_theme, ThemeError};
pub use timing::{TimingError, TimingPlan};
