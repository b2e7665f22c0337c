//! Structured scene logging.
//!
//! Consistent lifecycle messages for one scene, carrying the scene number
//! and the run size as fields.

use std::fmt::Display;

use tracing::{error, info, warn, Span};

/// Scene logger with consistent formatting.
#[derive(Debug, Clone)]
pub struct SceneLogger {
    scene_index: usize,
    total_scenes: usize,
}

impl SceneLogger {
    pub fn new(scene_index: usize, total_scenes: usize) -> Self {
        Self {
            scene_index,
            total_scenes,
        }
    }

    /// 1-based position for human-facing messages.
    pub fn position(&self) -> String {
        format!("{}/{}", self.scene_index + 1, self.total_scenes)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            scene = self.scene_index,
            total = self.total_scenes,
            "Scene {} started: {}", self.position(), message
        );
    }

    /// A generator failed and `asset` was substituted.
    pub fn log_fallback(&self, asset: &str, reason: &dyn Display) {
        warn!(
            scene = self.scene_index,
            total = self.total_scenes,
            asset,
            "Scene {}: {} generation failed ({}), using fallback",
            self.position(),
            asset,
            reason
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            scene = self.scene_index,
            total = self.total_scenes,
            "Scene {} warning: {}", self.position(), message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            scene = self.scene_index,
            total = self.total_scenes,
            "Scene {} error: {}", self.position(), message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            scene = self.scene_index,
            total = self.total_scenes,
            "Scene {} completed: {}", self.position(), message
        );
    }

    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    /// Span covering all work on this scene.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("scene", scene = self.scene_index, total = self.total_scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_one_based() {
        let logger = SceneLogger::new(0, 57);
        assert_eq!(logger.position(), "1/57");
        assert_eq!(logger.scene_index(), 0);
    }
}
