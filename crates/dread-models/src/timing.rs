//! Scene timing model.
//!
//! The final video has a fixed target length. Scenes share it equally after
//! subtracting the time consumed by transitions between them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default target length of the final video in seconds.
pub const DEFAULT_TARGET_SECONDS: f64 = 600.0;
/// Default cross-fade duration between consecutive scenes in seconds.
pub const DEFAULT_TRANSITION_SECONDS: f64 = 0.5;

/// Errors for impossible timing requests.
#[derive(Debug, Error, PartialEq)]
pub enum TimingError {
    #[error("At least one scene is required to compute timing")]
    NoScenes,

    #[error("{num_scenes} scenes leave no time per scene (computed {scene_duration:.3}s)")]
    NonPositiveDuration { num_scenes: usize, scene_duration: f64 },
}

/// Per-scene and total durations for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingPlan {
    num_scenes: usize,
    scene_duration: f64,
    transition: f64,
}

impl TimingPlan {
    /// Split `target_total` seconds across `num_scenes` scenes.
    ///
    /// `scene_duration = (target_total - (num_scenes - 1) * transition) / num_scenes`
    pub fn new(num_scenes: usize, target_total: f64, transition: f64) -> Result<Self, TimingError> {
        if num_scenes == 0 {
            return Err(TimingError::NoScenes);
        }
        let gaps = (num_scenes - 1) as f64 * transition;
        let scene_duration = (target_total - gaps) / num_scenes as f64;
        Self::with_scene_duration(num_scenes, scene_duration, transition)
    }

    /// Plan with the default target length and transition.
    pub fn with_defaults(num_scenes: usize) -> Result<Self, TimingError> {
        Self::new(num_scenes, DEFAULT_TARGET_SECONDS, DEFAULT_TRANSITION_SECONDS)
    }

    /// Plan for callers that already know the per-scene length.
    pub fn with_scene_duration(
        num_scenes: usize,
        scene_duration: f64,
        transition: f64,
    ) -> Result<Self, TimingError> {
        if num_scenes == 0 {
            return Err(TimingError::NoScenes);
        }
        if !(scene_duration > 0.0) {
            return Err(TimingError::NonPositiveDuration {
                num_scenes,
                scene_duration,
            });
        }
        Ok(Self {
            num_scenes,
            scene_duration,
            transition,
        })
    }

    pub fn num_scenes(&self) -> usize {
        self.num_scenes
    }

    /// Length of each rendered scene clip in seconds.
    pub fn scene_duration(&self) -> f64 {
        self.scene_duration
    }

    /// Cross-fade length between scenes in seconds.
    pub fn transition(&self) -> f64 {
        self.transition
    }

    /// Nominal runtime: every scene plus every transition gap.
    pub fn total_duration(&self) -> f64 {
        self.num_scenes as f64 * self.scene_duration
            + (self.num_scenes - 1) as f64 * self.transition
    }

    /// Runtime of `clip_count` clips concatenated with overlapping cross-fades.
    ///
    /// Each cross-fade consumes `transition` seconds of the two clips it joins.
    pub fn assembled_duration(&self, clip_count: usize) -> f64 {
        if clip_count == 0 {
            return 0.0;
        }
        clip_count as f64 * self.scene_duration - (clip_count - 1) as f64 * self.transition
    }

    /// Upper bound for subtitle cues inside a scene.
    pub fn subtitle_window(&self) -> f64 {
        self.scene_duration * 0.9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_matches_target() {
        for n in 1..=200 {
            let plan = TimingPlan::with_defaults(n).unwrap();
            assert!(
                (plan.total_duration() - DEFAULT_TARGET_SECONDS).abs() < 1e-6,
                "n={} total={}",
                n,
                plan.total_duration()
            );
        }
    }

    #[test]
    fn test_single_scene_uses_whole_target() {
        let plan = TimingPlan::new(1, 42.0, 0.5).unwrap();
        assert!((plan.scene_duration() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_typical_scene_duration() {
        // 57 scenes: (600 - 56 * 0.5) / 57
        let plan = TimingPlan::with_defaults(57).unwrap();
        assert!((plan.scene_duration() - 572.0 / 57.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_scenes_rejected() {
        assert_eq!(TimingPlan::with_defaults(0), Err(TimingError::NoScenes));
    }

    #[test]
    fn test_too_many_scenes_rejected() {
        // 2000 transitions of 0.5s already exceed 600s
        let result = TimingPlan::with_defaults(2001);
        assert!(matches!(result, Err(TimingError::NonPositiveDuration { .. })));
    }

    #[test]
    fn test_assembled_duration() {
        let plan = TimingPlan::with_scene_duration(3, 10.0, 0.5).unwrap();
        assert!((plan.assembled_duration(3) - 29.0).abs() < 1e-9);
        assert!((plan.assembled_duration(1) - 10.0).abs() < 1e-9);
        assert_eq!(plan.assembled_duration(0), 0.0);
        assert!((plan.subtitle_window() - 9.0).abs() < 1e-9);
    }
}
