//! Run modes: full generation and assemble-only.

use std::path::PathBuf;

use dread_media::{check_transition, Assembler, AssemblyReport, AssemblyRequest, FfmpegRunner};
use dread_models::{sanitize_theme, Script, TimingPlan};
use tracing::info;

use crate::artifacts::discover_rendered_scenes;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::{Collaborators, SceneOrchestrator, SceneOutcome};

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Sanitized theme used for the output name
    pub theme: String,
    pub timing: TimingPlan,
    /// Per-scene outcomes; empty for assemble-only runs
    pub scenes: Vec<SceneOutcome>,
    pub assembly: AssemblyReport,
}

impl RunSummary {
    pub fn output(&self) -> &PathBuf {
        &self.assembly.output
    }
}

/// Scene generation and assembly wired from one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    orchestrator: SceneOrchestrator,
    assembler: Assembler,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> PipelineResult<Self> {
        config.validate()?;
        let runner = FfmpegRunner::new().with_optional_timeout(config.ffmpeg_timeout_secs);
        let assembler = Assembler::new(config.render.encoding.clone(), runner);
        let orchestrator = SceneOrchestrator::new(&config, collaborators);
        Ok(Self {
            config,
            orchestrator,
            assembler,
        })
    }

    /// Pipeline with the real generator clients and FFmpeg renderer.
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Self::new(config, collaborators)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate and render every scene of `script`, then assemble the video.
    ///
    /// Scenes are processed strictly one after another. A render failure
    /// stops the run; generator failures only produce fallback assets.
    pub async fn run_full(
        &self,
        theme: &str,
        script: &Script,
        force_regenerate: bool,
    ) -> PipelineResult<RunSummary> {
        let theme = sanitize_theme(theme)?;
        let output = self.config.output_path(&theme)?;
        let timing = self.plan_timing(script.len())?;

        tokio::fs::create_dir_all(&self.config.work_dir).await?;

        let mut scenes = Vec::with_capacity(script.len());
        for (index, scene) in script.scenes.iter().enumerate() {
            let outcome = self
                .orchestrator
                .process_scene(index, scene, &timing, force_regenerate)
                .await?;
            scenes.push(outcome);
        }

        let request = AssemblyRequest::for_scenes(
            0..script.len(),
            &self.config.work_dir,
            timing.scene_duration(),
            timing.transition(),
            output,
        );
        let assembly = self.assembler.assemble(&request).await?;

        Ok(RunSummary {
            theme,
            timing,
            scenes,
            assembly,
        })
    }

    /// Assemble clips already rendered into the work directory.
    ///
    /// Timing is derived from the number of clips found.
    pub async fn run_assemble_only(&self, theme: &str) -> PipelineResult<RunSummary> {
        let theme = sanitize_theme(theme)?;
        let output = self.config.output_path(&theme)?;

        let work_dir = &self.config.work_dir;
        let clips = match discover_rendered_scenes(work_dir).await {
            Ok(clips) => clips,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if clips.is_empty() {
            return Err(PipelineError::NothingToAssemble(work_dir.clone()));
        }
        info!("Found {} rendered scenes in {}", clips.len(), work_dir.display());

        let timing = self.plan_timing(clips.len())?;

        let request = AssemblyRequest {
            clips,
            scene_duration: timing.scene_duration(),
            transition: timing.transition(),
            output,
        };
        let assembly = self.assembler.assemble(&request).await?;

        Ok(RunSummary {
            theme,
            timing,
            scenes: Vec::new(),
            assembly,
        })
    }

    /// Timing for `num_scenes`, rejected up front when the clips could not be cross-faded.
    fn plan_timing(&self, num_scenes: usize) -> PipelineResult<TimingPlan> {
        let timing = self.config.timing_for(num_scenes)?;
        check_transition(timing.num_scenes(), timing.scene_duration(), timing.transition())?;
        log_timing(&timing);
        Ok(timing)
    }
}

fn log_timing(timing: &TimingPlan) {
    info!(
        scenes = timing.num_scenes(),
        "Estimated video length: {:.2} minutes ({:.2}s per scene)",
        timing.total_duration() / 60.0,
        timing.scene_duration()
    );
}
