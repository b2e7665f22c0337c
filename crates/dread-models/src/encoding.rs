//! Output encoding configuration.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset for scene renders
pub const DEFAULT_PRESET: &str = "fast";
/// Frame rate of the assembled video
pub const DEFAULT_FPS: u32 = 20;
/// Audio sample rate used everywhere in the pipeline
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Resolution = Resolution {
        width: 1280,
        height: 720,
    };

    /// `WxH` form used by FFmpeg size options.
    pub fn as_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD
    }
}

/// Encoding settings shared by scene renders and final assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEncoding {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Encoding preset (e.g., "fast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Frame rate of the final video
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Audio sample rate in Hz
    #[serde(default = "default_audio_sample_rate")]
    pub audio_sample_rate: u32,

    /// Frame size of rendered scenes
    #[serde(default)]
    pub resolution: Resolution,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_audio_sample_rate() -> u32 {
    DEFAULT_AUDIO_SAMPLE_RATE
}

impl Default for OutputEncoding {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            preset: default_preset(),
            fps: DEFAULT_FPS,
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            resolution: Resolution::HD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let enc = OutputEncoding::default();
        assert_eq!(enc.video_codec, "libx264");
        assert_eq!(enc.audio_codec, "aac");
        assert_eq!(enc.fps, 20);
        assert_eq!(enc.resolution.as_size(), "1280x720");
    }

    #[test]
    fn test_partial_deserialize() {
        let enc: OutputEncoding = serde_json::from_str(r#"{"fps": 24}"#).unwrap();
        assert_eq!(enc.fps, 24);
        assert_eq!(enc.audio_sample_rate, DEFAULT_AUDIO_SAMPLE_RATE);
        assert_eq!(enc.resolution, Resolution::HD);
    }
}
