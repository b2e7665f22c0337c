//! Per-scene render: still image, music bed, narration and burned subtitles.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dread_models::{KenBurns, OutputEncoding, SubtitleStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters;
use crate::fs_utils::{discard_partial, ensure_parent, finish_partial, partial_path};

/// Default level of the background music under the narration.
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.3;
/// Default level of the narration.
pub const DEFAULT_VOICE_VOLUME: f64 = 1.0;

/// Everything one scene render needs.
#[derive(Debug, Clone)]
pub struct SceneRenderRequest {
    pub scene_index: usize,
    /// Still image, looped as the video stream
    pub image: PathBuf,
    /// Background music
    pub bgm: PathBuf,
    /// Narration audio
    pub voice: PathBuf,
    /// SubRip subtitles burned into the frame
    pub subtitles: PathBuf,
    /// Rendered clip
    pub output: PathBuf,
    /// Clip length in seconds
    pub duration: f64,
}

impl SceneRenderRequest {
    fn inputs(&self) -> [&Path; 4] {
        [&self.image, &self.bgm, &self.voice, &self.subtitles]
    }
}

/// Look and mix of rendered scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub encoding: OutputEncoding,
    #[serde(default)]
    pub subtitle_style: SubtitleStyle,
    #[serde(default)]
    pub ken_burns: KenBurns,
    #[serde(default = "default_music_volume")]
    pub bgm_volume: f64,
    #[serde(default = "default_voice_volume")]
    pub voice_volume: f64,
}

fn default_music_volume() -> f64 {
    DEFAULT_MUSIC_VOLUME
}
fn default_voice_volume() -> f64 {
    DEFAULT_VOICE_VOLUME
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            encoding: OutputEncoding::default(),
            subtitle_style: SubtitleStyle::default(),
            ken_burns: KenBurns::default(),
            bgm_volume: DEFAULT_MUSIC_VOLUME,
            voice_volume: DEFAULT_VOICE_VOLUME,
        }
    }
}

/// Turns a scene's assets into a clip.
#[async_trait]
pub trait SceneRenderer: Send + Sync {
    async fn render(&self, request: &SceneRenderRequest) -> MediaResult<()>;
}

/// Renders scenes with a single FFmpeg invocation each.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSceneRenderer {
    settings: RenderSettings,
    runner: FfmpegRunner,
}

impl FfmpegSceneRenderer {
    pub fn new(settings: RenderSettings, runner: FfmpegRunner) -> Self {
        Self { settings, runner }
    }

    /// Build the FFmpeg command writing to `output`.
    pub fn build_command(&self, request: &SceneRenderRequest, output: &Path) -> FfmpegCommand {
        let enc = &self.settings.encoding;
        let graph = filters::scene_graph(
            enc.resolution,
            self.settings.ken_burns,
            &request.subtitles,
            &self.settings.subtitle_style,
            self.settings.bgm_volume,
            self.settings.voice_volume,
        );

        FfmpegCommand::new(output)
            .looped_image(&request.image)
            .input(&request.bgm)
            .input(&request.voice)
            .filter_complex(graph)
            .map("[out]")
            .map("[a]")
            .duration(request.duration)
            .video_codec(&enc.video_codec)
            .preset(&enc.preset)
            .pixel_format("yuv420p")
            .audio_codec(&enc.audio_codec)
            .audio_sample_rate(enc.audio_sample_rate)
    }
}

#[async_trait]
impl SceneRenderer for FfmpegSceneRenderer {
    async fn render(&self, request: &SceneRenderRequest) -> MediaResult<()> {
        if let Some(missing) = request.inputs().into_iter().find(|p| !p.exists()) {
            return Err(MediaError::MissingAsset(missing.to_path_buf()));
        }

        ensure_parent(&request.output).await?;
        let tmp = partial_path(&request.output);
        let cmd = self.build_command(request, &tmp);

        info!(
            scene = request.scene_index,
            duration = request.duration,
            "Rendering scene to {}",
            request.output.display()
        );

        let total = request.duration;
        let scene = request.scene_index;
        let result = self
            .runner
            .run_with_progress(&cmd, move |p| {
                if p.is_complete {
                    debug!(scene, "Scene render finished encoding");
                } else {
                    debug!(scene, "Scene render {:.0}%", p.percentage(total));
                }
            })
            .await;

        match result {
            Ok(()) => finish_partial(&tmp, &request.output).await,
            Err(e) => {
                discard_partial(&tmp).await;
                Err(e.into_render_failure(request.scene_index))
            }
        }
    }
}
