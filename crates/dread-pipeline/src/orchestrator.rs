//! Scene asset orchestration.
//!
//! For each scene the orchestrator produces an image, background music,
//! narration and subtitles, then hands them to the renderer. Generator
//! failures never abort a scene: each asset has a fallback that is resolved
//! right where the generator is called. Only a render failure is fatal.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dread_generators::{
    build_client, ensure_image, image_prompt, music_duration, music_prompt, EdgeTtsCli,
    FalMusicClient, GenerationResult, HttpPlaceholder, HuggingFaceImageClient, ImageGenerator,
    MusicGenerator, PlaceholderSource, SpeechRate, SpeechSynthesizer,
};
use dread_media::fs_utils::write_atomic;
use dread_media::{
    build_cues, measure_duration, write_blank_frame, write_silent_wav, write_srt,
    FfmpegRunner, FfmpegSceneRenderer, SceneRenderRequest, SceneRenderer,
};
use dread_models::{Resolution, Scene, TimingPlan};
use serde::Serialize;
use tracing::{debug, Instrument};

use crate::artifacts::SceneArtifacts;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::logging::SceneLogger;

const IMAGE_SERVICE: &str = "image generator";

/// External services a scene depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub images: Arc<dyn ImageGenerator>,
    pub placeholder: Arc<dyn PlaceholderSource>,
    pub music: Arc<dyn MusicGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub renderer: Arc<dyn SceneRenderer>,
}

impl Collaborators {
    /// Real clients built from configuration.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let client = build_client(config.http_timeout)?;
        let runner = FfmpegRunner::new().with_optional_timeout(config.ffmpeg_timeout_secs);

        Ok(Self {
            images: Arc::new(HuggingFaceImageClient::new(
                client.clone(),
                config.image_endpoint.clone(),
                config.hf_token.clone(),
            )),
            placeholder: Arc::new(HttpPlaceholder::new(client.clone(), config.placeholder_url.clone())),
            music: Arc::new(
                FalMusicClient::new(client, config.fal_key.clone()).with_base_url(config.fal_queue_url.clone()),
            ),
            speech: Arc::new(EdgeTtsCli::new(config.tts_voice.clone()).with_timeout(Some(config.http_timeout))),
            renderer: Arc::new(FfmpegSceneRenderer::new(config.render.clone(), runner)),
        })
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// How an asset came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    /// Produced by its generator during this run
    Generated,
    /// Reused from an earlier run
    Cached,
    /// Substituted after the generator failed
    Fallback,
}

/// A resolved scene asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub path: PathBuf,
    pub source: AssetSource,
}

impl Asset {
    fn new(path: &Path, source: AssetSource) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Everything that went into one rendered scene.
#[derive(Debug, Clone, Serialize)]
pub struct SceneOutcome {
    pub scene_index: usize,
    pub image: Asset,
    pub bgm: Asset,
    pub voice: Asset,
    pub subtitles: PathBuf,
    pub cue_count: usize,
    pub clip: PathBuf,
}

impl SceneOutcome {
    /// Number of assets that fell back.
    pub fn fallback_count(&self) -> usize {
        [&self.image, &self.bgm, &self.voice]
            .iter()
            .filter(|a| a.source == AssetSource::Fallback)
            .count()
    }
}

/// Produces and renders scenes one at a time.
#[derive(Debug, Clone)]
pub struct SceneOrchestrator {
    work_dir: PathBuf,
    resolution: Resolution,
    sample_rate: u32,
    collaborators: Collaborators,
}

impl SceneOrchestrator {
    pub fn new(config: &PipelineConfig, collaborators: Collaborators) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            resolution: config.render.encoding.resolution,
            sample_rate: config.render.encoding.audio_sample_rate,
            collaborators,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Generate assets for scene `index` and render its clip.
    ///
    /// Image and music are reused from the work directory unless
    /// `force_regenerate` is set; narration is always regenerated.
    pub async fn process_scene(
        &self,
        index: usize,
        scene: &Scene,
        timing: &TimingPlan,
        force_regenerate: bool,
    ) -> PipelineResult<SceneOutcome> {
        let logger = SceneLogger::new(index, timing.num_scenes());
        let span = logger.create_span();
        self.process_scene_inner(index, scene, timing, force_regenerate, &logger)
            .instrument(span)
            .await
    }

    async fn process_scene_inner(
        &self,
        index: usize,
        scene: &Scene,
        timing: &TimingPlan,
        force_regenerate: bool,
        logger: &SceneLogger,
    ) -> PipelineResult<SceneOutcome> {
        let paths = SceneArtifacts::new(&self.work_dir, index);
        let duration = timing.scene_duration();
        logger.log_start(&format!("generating assets for {:.2}s", duration));

        let image = self.resolve_image(&paths, scene, force_regenerate, logger).await?;
        let bgm = self
            .resolve_music(&paths, scene, duration, force_regenerate, logger)
            .await?;
        let voice = self.resolve_voice(&paths, scene, duration, logger).await?;

        let measured = match measure_duration(&voice.path).await {
            Ok(seconds) => Some(seconds),
            Err(e) => {
                logger.log_warning(&format!("could not measure narration ({}), using 90% of scene", e));
                None
            }
        };
        let cues = build_cues(&scene.narration, measured, duration);
        write_srt(&paths.subtitles, &cues).await?;

        let request = SceneRenderRequest {
            scene_index: index,
            image: image.path.clone(),
            bgm: bgm.path.clone(),
            voice: voice.path.clone(),
            subtitles: paths.subtitles.clone(),
            output: paths.clip.clone(),
            duration,
        };
        if let Err(e) = self.collaborators.renderer.render(&request).await {
            logger.log_error(&e.to_string());
            return Err(e.into());
        }

        let outcome = SceneOutcome {
            scene_index: index,
            image,
            bgm,
            voice,
            subtitles: paths.subtitles,
            cue_count: cues.len(),
            clip: paths.clip,
        };
        logger.log_completion(&format!(
            "rendered {} ({} fallback assets)",
            outcome.clip.display(),
            outcome.fallback_count()
        ));
        Ok(outcome)
    }

    async fn resolve_image(
        &self,
        paths: &SceneArtifacts,
        scene: &Scene,
        force_regenerate: bool,
        logger: &SceneLogger,
    ) -> PipelineResult<Asset> {
        if !force_regenerate && paths.image.exists() {
            debug!("Reusing cached image {}", paths.image.display());
            return Ok(Asset::new(&paths.image, AssetSource::Cached));
        }

        match self.generate_image(&scene.visual).await {
            Ok(bytes) => {
                write_atomic(&paths.image, &bytes).await?;
                return Ok(Asset::new(&paths.image, AssetSource::Generated));
            }
            Err(e) => logger.log_fallback("image", &e),
        }

        match self.collaborators.placeholder.fetch().await {
            Ok(bytes) => write_atomic(&paths.fallback_image, &bytes).await?,
            Err(e) => {
                logger.log_warning(&format!("placeholder fetch failed ({}), drawing a blank frame", e));
                write_blank_frame(&paths.fallback_image, self.resolution).await?;
            }
        }
        Ok(Asset::new(&paths.fallback_image, AssetSource::Fallback))
    }

    async fn generate_image(&self, visual: &str) -> GenerationResult<Vec<u8>> {
        let bytes = self.collaborators.images.generate(&image_prompt(visual)).await?;
        ensure_image(IMAGE_SERVICE, bytes)
    }

    async fn resolve_music(
        &self,
        paths: &SceneArtifacts,
        scene: &Scene,
        duration: f64,
        force_regenerate: bool,
        logger: &SceneLogger,
    ) -> PipelineResult<Asset> {
        if !force_regenerate && paths.bgm.exists() {
            debug!("Reusing cached music {}", paths.bgm.display());
            return Ok(Asset::new(&paths.bgm, AssetSource::Cached));
        }

        let generated = self
            .collaborators
            .music
            .generate(&music_prompt(&scene.mood), music_duration(duration))
            .await;
        match generated {
            Ok(bytes) => {
                write_atomic(&paths.bgm, &bytes).await?;
                Ok(Asset::new(&paths.bgm, AssetSource::Generated))
            }
            Err(e) => {
                logger.log_fallback("music", &e);
                write_silent_wav(&paths.silent_audio, duration, self.sample_rate).await?;
                Ok(Asset::new(&paths.silent_audio, AssetSource::Fallback))
            }
        }
    }

    async fn resolve_voice(
        &self,
        paths: &SceneArtifacts,
        scene: &Scene,
        duration: f64,
        logger: &SceneLogger,
    ) -> PipelineResult<Asset> {
        let synthesized = self
            .collaborators
            .speech
            .synthesize(&scene.narration, SpeechRate::for_scene_duration(duration))
            .await;
        match synthesized {
            Ok(bytes) => {
                write_atomic(&paths.voice, &bytes).await?;
                Ok(Asset::new(&paths.voice, AssetSource::Generated))
            }
            Err(e) => {
                logger.log_fallback("narration", &e);
                write_silent_wav(&paths.silent_audio, duration, self.sample_rate).await?;
                Ok(Asset::new(&paths.silent_audio, AssetSource::Fallback))
            }
        }
    }
}
