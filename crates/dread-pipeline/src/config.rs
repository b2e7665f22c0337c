//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use dread_generators::music::DEFAULT_FAL_QUEUE_URL;
use dread_generators::speech::DEFAULT_TTS_VOICE;
use dread_generators::visual::{DEFAULT_IMAGE_ENDPOINT, DEFAULT_PLACEHOLDER_URL};
use dread_media::RenderSettings;
use dread_models::timing::{DEFAULT_TARGET_SECONDS, DEFAULT_TRANSITION_SECONDS};
use dread_models::{sanitize_theme, ThemeError, TimingError, TimingPlan};

use crate::error::{PipelineError, PipelineResult};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-scene artifact cache
    pub work_dir: PathBuf,
    /// Directory for final videos
    pub output_dir: PathBuf,
    /// Target length of the final video in seconds
    pub target_seconds: f64,
    /// Cross-fade between scenes in seconds
    pub transition_seconds: f64,
    /// Scene render look, mix and encoding
    pub render: RenderSettings,
    /// Narrator voice for edge-tts
    pub tts_voice: String,
    /// Text-to-image endpoint
    pub image_endpoint: String,
    /// Placeholder image URL used when image generation fails
    pub placeholder_url: String,
    /// fal.ai queue base URL
    pub fal_queue_url: String,
    /// Hugging Face API token
    pub hf_token: Option<String>,
    /// fal.ai API key
    pub fal_key: Option<String>,
    /// Timeout for HTTP calls and speech synthesis
    pub http_timeout: Duration,
    /// Optional limit on each FFmpeg invocation, in seconds
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("assets/temp"),
            output_dir: PathBuf::from("assets/JP_hor_wc"),
            target_seconds: DEFAULT_TARGET_SECONDS,
            transition_seconds: DEFAULT_TRANSITION_SECONDS,
            render: RenderSettings::default(),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            image_endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            placeholder_url: DEFAULT_PLACEHOLDER_URL.to_string(),
            fal_queue_url: DEFAULT_FAL_QUEUE_URL.to_string(),
            hf_token: None,
            fal_key: None,
            http_timeout: Duration::from_secs(120),
            ffmpeg_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            work_dir: non_empty("DREAD_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: non_empty("DREAD_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            target_seconds: non_empty("DREAD_TARGET_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.target_seconds),
            transition_seconds: non_empty("DREAD_TRANSITION_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.transition_seconds),
            render: defaults.render,
            tts_voice: non_empty("DREAD_TTS_VOICE").unwrap_or(defaults.tts_voice),
            image_endpoint: non_empty("DREAD_IMAGE_ENDPOINT").unwrap_or(defaults.image_endpoint),
            placeholder_url: non_empty("DREAD_PLACEHOLDER_URL").unwrap_or(defaults.placeholder_url),
            fal_queue_url: non_empty("DREAD_FAL_QUEUE_URL").unwrap_or(defaults.fal_queue_url),
            hf_token: non_empty("HF_TOKEN"),
            fal_key: non_empty("FAL_KEY").or_else(|| non_empty("FALAI_KEY")),
            http_timeout: Duration::from_secs(
                non_empty("DREAD_HTTP_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.http_timeout.as_secs()),
            ),
            ffmpeg_timeout_secs: non_empty("DREAD_FFMPEG_TIMEOUT_SECS").and_then(|s| s.parse().ok()),
        }
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.target_seconds > 0.0) {
            return Err(PipelineError::config(format!(
                "target length must be positive, got {}",
                self.target_seconds
            )));
        }
        if !(self.transition_seconds >= 0.0) {
            return Err(PipelineError::config(format!(
                "transition must not be negative, got {}",
                self.transition_seconds
            )));
        }
        if self.http_timeout.is_zero() {
            return Err(PipelineError::config("HTTP timeout must be positive"));
        }
        Ok(())
    }

    /// Timing for a run with `num_scenes` scenes.
    pub fn timing_for(&self, num_scenes: usize) -> Result<TimingPlan, TimingError> {
        TimingPlan::new(num_scenes, self.target_seconds, self.transition_seconds)
    }

    /// Final video path for `theme`.
    pub fn output_path(&self, theme: &str) -> Result<PathBuf, ThemeError> {
        Ok(self.output_dir.join(format!("{}.mp4", sanitize_theme(theme)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[]));
        assert_eq!(config.work_dir, PathBuf::from("assets/temp"));
        assert_eq!(config.output_dir, PathBuf::from("assets/JP_hor_wc"));
        assert_eq!(config.target_seconds, 600.0);
        assert_eq!(config.transition_seconds, 0.5);
        assert_eq!(config.tts_voice, "en-US-AriaNeural");
        assert!(config.hf_token.is_none());
        assert!(config.ffmpeg_timeout_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("DREAD_WORK_DIR", "/tmp/dread"),
            ("DREAD_TARGET_SECONDS", "120"),
            ("DREAD_TRANSITION_SECONDS", "not a number"),
            ("FALAI_KEY", "legacy"),
            ("HF_TOKEN", "  "),
            ("DREAD_FFMPEG_TIMEOUT_SECS", "900"),
        ]));
        assert_eq!(config.work_dir, PathBuf::from("/tmp/dread"));
        assert_eq!(config.target_seconds, 120.0);
        assert_eq!(config.transition_seconds, 0.5);
        assert_eq!(config.fal_key.as_deref(), Some("legacy"));
        assert!(config.hf_token.is_none());
        assert_eq!(config.ffmpeg_timeout_secs, Some(900));
    }

    #[test]
    fn test_fal_key_preferred_over_legacy_name() {
        let config = PipelineConfig::from_lookup(lookup(&[("FAL_KEY", "new"), ("FALAI_KEY", "old")]));
        assert_eq!(config.fal_key.as_deref(), Some("new"));
    }

    #[test]
    fn test_validate() {
        let config = PipelineConfig {
            target_seconds: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let config = PipelineConfig {
            transition_seconds: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_path() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.output_path("Haunted Forest!").unwrap(),
            PathBuf::from("assets/JP_hor_wc/haunted_forest.mp4")
        );
        assert!(config.output_path("!!!").is_err());
    }

    #[test]
    fn test_timing_for() {
        let timing = PipelineConfig::default().timing_for(60).unwrap();
        assert!((timing.scene_duration() - 9.5083333).abs() < 1e-6);
        assert!(PipelineConfig::default().timing_for(0).is_err());
    }
}
