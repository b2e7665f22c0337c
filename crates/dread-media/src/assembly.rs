//! Assembly of rendered scene clips into the final video.
//!
//! Clips are conformed to the scene length (truncated or loop-extended),
//! joined with overlapping cross-fades and loudness-normalized in a single
//! FFmpeg pass. Missing or unreadable clips are skipped, never fatal.

use std::fmt;
use std::path::{Path, PathBuf};

use dread_models::OutputEncoding;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaError;
use crate::filters;
use crate::fs_utils::{discard_partial, ensure_parent, finish_partial, partial_path};
use crate::probe::probe_media;

/// Clips within this many seconds of the scene length are used as-is.
pub const DURATION_TOLERANCE: f64 = 0.01;

/// Result type for assembly.
pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Errors that stop assembly.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No rendered scene clips available to assemble")]
    NoClips,

    #[error("Transition of {transition}s must be positive and shorter than the {scene_duration}s scene")]
    InvalidTransition { transition: f64, scene_duration: f64 },

    #[error(transparent)]
    Media(#[from] MediaError),
}

/// File name of the rendered clip for a scene.
pub fn scene_clip_name(scene_index: usize) -> String {
    format!("scene_{}.mp4", scene_index)
}

/// Cross-fading `clip_count` clips needs `0 < transition < scene_duration`.
///
/// A single clip never cross-fades, so any transition is accepted for it.
pub fn check_transition(clip_count: usize, scene_duration: f64, transition: f64) -> AssemblyResult<()> {
    if clip_count > 1 && !(transition > 0.0 && transition < scene_duration) {
        return Err(AssemblyError::InvalidTransition {
            transition,
            scene_duration,
        });
    }
    Ok(())
}

/// A rendered clip the caller wants in the final video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSource {
    pub scene_index: usize,
    pub path: PathBuf,
}

impl ClipSource {
    pub fn new(scene_index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            scene_index,
            path: path.into(),
        }
    }
}

/// A clip that exists and was probed successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedClip {
    pub scene_index: usize,
    pub path: PathBuf,
    /// Probed duration in seconds
    pub duration: f64,
    pub has_audio: bool,
}

/// How a clip is brought to the scene length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationFix {
    /// Already the right length
    None,
    /// Longer than the scene; cut at the scene length
    Truncate,
    /// Shorter than the scene; looped until the scene length
    LoopExtend,
}

impl DurationFix {
    pub fn for_duration(actual: f64, target: f64) -> Self {
        let deviation = actual - target;
        if deviation > DURATION_TOLERANCE {
            Self::Truncate
        } else if deviation < -DURATION_TOLERANCE {
            Self::LoopExtend
        } else {
            Self::None
        }
    }
}

/// One clip's place on the output timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedClip {
    pub scene_index: usize,
    pub path: PathBuf,
    pub has_audio: bool,
    pub fix: DurationFix,
    /// Cross-fade from the previous clip; `None` for the first clip
    pub fade_in: Option<f64>,
    /// Output time at which this clip starts
    pub offset: f64,
}

/// Pure timeline computation for a set of loaded clips.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyPlan {
    clips: Vec<PlannedClip>,
    scene_duration: f64,
    transition: f64,
    output_duration: f64,
}

impl AssemblyPlan {
    /// Lay out `clips` in order, each `scene_duration` long, overlapping by `transition`.
    pub fn build(clips: &[LoadedClip], scene_duration: f64, transition: f64) -> AssemblyResult<Self> {
        if clips.is_empty() {
            return Err(AssemblyError::NoClips);
        }
        check_transition(clips.len(), scene_duration, transition)?;
        let joins = clips.len() - 1;

        let planned = clips
            .iter()
            .enumerate()
            .map(|(k, clip)| PlannedClip {
                scene_index: clip.scene_index,
                path: clip.path.clone(),
                has_audio: clip.has_audio,
                fix: DurationFix::for_duration(clip.duration, scene_duration),
                fade_in: (k > 0).then_some(transition),
                offset: k as f64 * (scene_duration - transition),
            })
            .collect();

        Ok(Self {
            clips: planned,
            scene_duration,
            transition,
            output_duration: clips.len() as f64 * scene_duration - joins as f64 * transition,
        })
    }

    pub fn clips(&self) -> &[PlannedClip] {
        &self.clips
    }

    pub fn scene_duration(&self) -> f64 {
        self.scene_duration
    }

    pub fn transition(&self) -> f64 {
        self.transition
    }

    /// Runtime of the assembled video.
    pub fn output_duration(&self) -> f64 {
        self.output_duration
    }

    /// Complete filter graph; the outputs are `[{video}]` and `[aout]`.
    pub fn filter_graph(&self, encoding: &OutputEncoding, normalize: bool) -> (String, String) {
        let mut parts: Vec<String> = self
            .clips
            .iter()
            .enumerate()
            .map(|(k, clip)| {
                filters::conform_clip(
                    k,
                    self.scene_duration,
                    encoding.resolution,
                    encoding.fps,
                    encoding.audio_sample_rate,
                    clip.has_audio,
                )
            })
            .collect();

        let offsets: Vec<f64> = self.clips.iter().map(|c| c.offset).collect();
        let (chain, video, audio) = filters::crossfade_chain(&offsets, self.transition);
        if !chain.is_empty() {
            parts.push(chain);
        }
        parts.push(filters::finish_audio(&audio, normalize, encoding.audio_sample_rate));

        (parts.join(";"), video)
    }

    /// FFmpeg command reading the graph from `script` and writing `output`.
    pub fn command(
        &self,
        encoding: &OutputEncoding,
        video_label: &str,
        script: &Path,
        output: &Path,
    ) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(output);
        for clip in &self.clips {
            cmd = match clip.fix {
                DurationFix::LoopExtend => cmd.looped_input(&clip.path, self.scene_duration),
                DurationFix::Truncate => cmd.limited_input(&clip.path, self.scene_duration),
                DurationFix::None => cmd.input(&clip.path),
            };
        }

        cmd.filter_complex_script(script)
            .map(format!("[{}]", video_label))
            .map("[aout]")
            .video_codec(&encoding.video_codec)
            .preset(&encoding.preset)
            .pixel_format("yuv420p")
            .frame_rate(encoding.fps)
            .audio_codec(&encoding.audio_codec)
            .audio_sample_rate(encoding.audio_sample_rate)
            .duration(self.output_duration)
    }
}

/// Clips to assemble and the timing they were rendered with.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub clips: Vec<ClipSource>,
    pub scene_duration: f64,
    pub transition: f64,
    pub output: PathBuf,
}

impl AssemblyRequest {
    /// Request for `scene_{i}.mp4` clips in `clip_dir`, in the given order.
    pub fn for_scenes(
        indices: impl IntoIterator<Item = usize>,
        clip_dir: &Path,
        scene_duration: f64,
        transition: f64,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            clips: indices
                .into_iter()
                .map(|i| ClipSource::new(i, clip_dir.join(scene_clip_name(i))))
                .collect(),
            scene_duration,
            transition,
            output: output.into(),
        }
    }
}

/// Loudness normalization failed; the video was encoded without it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationWarning {
    pub message: String,
    pub stderr: Option<String>,
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audio normalization skipped: {}", self.message)
    }
}

/// Outcome of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub output: PathBuf,
    /// Scene indices in output order
    pub clips_used: Vec<usize>,
    /// Scene indices that were missing or unreadable
    pub skipped: Vec<usize>,
    /// Planned runtime in seconds
    pub duration: f64,
    pub normalization: Option<NormalizationWarning>,
}

/// Joins rendered clips into the final video.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    encoding: OutputEncoding,
    runner: FfmpegRunner,
}

impl Assembler {
    pub fn new(encoding: OutputEncoding, runner: FfmpegRunner) -> Self {
        Self { encoding, runner }
    }

    /// Probe every source; missing or unreadable clips are skipped with a warning.
    ///
    /// Returns the loaded clips and the scene indices that were skipped.
    pub async fn load_clips(&self, sources: &[ClipSource]) -> (Vec<LoadedClip>, Vec<usize>) {
        let mut loaded = Vec::with_capacity(sources.len());
        let mut skipped = Vec::new();

        for source in sources {
            if !source.path.exists() {
                warn!(scene = source.scene_index, "Clip {} missing, skipping", source.path.display());
                skipped.push(source.scene_index);
                continue;
            }

            match probe_media(&source.path).await {
                Ok(info) if info.has_video && info.duration > 0.0 => loaded.push(LoadedClip {
                    scene_index: source.scene_index,
                    path: source.path.clone(),
                    duration: info.duration,
                    has_audio: info.has_audio,
                }),
                Ok(_) => {
                    warn!(scene = source.scene_index, "Clip {} has no usable video, skipping", source.path.display());
                    skipped.push(source.scene_index);
                }
                Err(e) => {
                    warn!(scene = source.scene_index, "Could not probe {}: {}, skipping", source.path.display(), e);
                    skipped.push(source.scene_index);
                }
            }
        }

        (loaded, skipped)
    }

    /// Assemble the requested clips into `request.output`.
    pub async fn assemble(&self, request: &AssemblyRequest) -> AssemblyResult<AssemblyReport> {
        let (loaded, skipped) = self.load_clips(&request.clips).await;
        if loaded.is_empty() {
            warn!("None of the {} requested clips could be loaded", request.clips.len());
            return Err(AssemblyError::NoClips);
        }

        let plan = AssemblyPlan::build(&loaded, request.scene_duration, request.transition)?;
        for clip in plan.clips().iter().filter(|c| c.fix != DurationFix::None) {
            debug!(scene = clip.scene_index, fix = ?clip.fix, "Adjusting clip length");
        }

        info!(
            clips = plan.clips().len(),
            skipped = skipped.len(),
            duration = plan.output_duration(),
            "Assembling {}",
            request.output.display()
        );

        let normalization = self.write_plan(&plan, &request.output).await?;

        Ok(AssemblyReport {
            output: request.output.clone(),
            clips_used: plan.clips().iter().map(|c| c.scene_index).collect(),
            skipped,
            duration: plan.output_duration(),
            normalization,
        })
    }

    /// Encode `plan` into `output`.
    ///
    /// A failed loudness-normalized pass is retried once without loudnorm;
    /// the returned warning records why. Nothing is left at `output` or its
    /// partial path unless the encode succeeds.
    pub async fn write_plan(
        &self,
        plan: &AssemblyPlan,
        output: &Path,
    ) -> AssemblyResult<Option<NormalizationWarning>> {
        ensure_parent(output).await?;
        let tmp = partial_path(output);

        let normalization = match self.encode(plan, true, &tmp).await {
            Ok(()) => None,
            Err(MediaError::FfmpegFailed { message, stderr, .. }) => {
                let warning = NormalizationWarning { message, stderr };
                warn!("{}; re-encoding without loudnorm", warning);
                discard_partial(&tmp).await;

                if let Err(e) = self.encode(plan, false, &tmp).await {
                    discard_partial(&tmp).await;
                    return Err(e.into());
                }
                Some(warning)
            }
            Err(e) => {
                discard_partial(&tmp).await;
                return Err(e.into());
            }
        };

        finish_partial(&tmp, output).await?;
        info!("Final video written to {}", output.display());
        Ok(normalization)
    }

    /// One FFmpeg pass. The filter script file is removed when this returns.
    async fn encode(&self, plan: &AssemblyPlan, normalize: bool, output: &Path) -> Result<(), MediaError> {
        let (graph, video_label) = plan.filter_graph(&self.encoding, normalize);

        let script = tempfile::Builder::new()
            .prefix("dread_assembly_")
            .suffix(".txt")
            .tempfile()?;
        tokio::fs::write(script.path(), graph.as_bytes()).await?;

        let cmd = plan.command(&self.encoding, &video_label, script.path(), output);
        let total = plan.output_duration();
        self.runner
            .run_with_progress(&cmd, move |p| {
                debug!("Assembly {:.0}% (speed {:.2}x)", p.percentage(total), p.speed);
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn clip(scene_index: usize, duration: f64) -> LoadedClip {
        LoadedClip {
            scene_index,
            path: PathBuf::from(format!("/work/scene_{}.mp4", scene_index)),
            duration,
            has_audio: true,
        }
    }

    #[test]
    fn test_plan_conforms_clip_lengths() {
        let clips = [clip(0, 9.8), clip(1, 10.2), clip(2, 10.0)];
        let plan = AssemblyPlan::build(&clips, 10.0, 0.5).unwrap();

        let fixes: Vec<_> = plan.clips().iter().map(|c| c.fix).collect();
        assert_eq!(
            fixes,
            [DurationFix::LoopExtend, DurationFix::Truncate, DurationFix::None]
        );

        let fades: Vec<_> = plan.clips().iter().map(|c| c.fade_in).collect();
        assert_eq!(fades, [None, Some(0.5), Some(0.5)]);

        let offsets: Vec<_> = plan.clips().iter().map(|c| c.offset).collect();
        assert_eq!(offsets, [0.0, 9.5, 19.0]);

        assert!((plan.output_duration() - 29.0).abs() < 1e-9);
    }

    #[test]
    fn test_tolerance() {
        assert_eq!(DurationFix::for_duration(10.005, 10.0), DurationFix::None);
        assert_eq!(DurationFix::for_duration(9.995, 10.0), DurationFix::None);
        assert_eq!(DurationFix::for_duration(10.05, 10.0), DurationFix::Truncate);
        assert_eq!(DurationFix::for_duration(9.9, 10.0), DurationFix::LoopExtend);
    }

    #[test]
    fn test_plan_rejects_empty_and_bad_transition() {
        assert!(matches!(AssemblyPlan::build(&[], 10.0, 0.5), Err(AssemblyError::NoClips)));

        let two = [clip(0, 10.0), clip(1, 10.0)];
        assert!(matches!(
            AssemblyPlan::build(&two, 10.0, 10.0),
            Err(AssemblyError::InvalidTransition { .. })
        ));
        assert!(matches!(
            AssemblyPlan::build(&two, 10.0, 0.0),
            Err(AssemblyError::InvalidTransition { .. })
        ));

        // A single clip never cross-fades
        let single = AssemblyPlan::build(&[clip(5, 10.0)], 10.0, 0.0).unwrap();
        assert!((single.output_duration() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_check_transition() {
        assert!(check_transition(2, 10.0, 0.5).is_ok());
        assert!(check_transition(1, 0.1, 0.5).is_ok());
        assert!(check_transition(0, 10.0, 0.0).is_ok());
        assert!(matches!(
            check_transition(1000, 0.1005, 0.5),
            Err(AssemblyError::InvalidTransition { .. })
        ));
        assert!(check_transition(2, 10.0, f64::NAN).is_err());
    }

    #[test]
    fn test_filter_graph() {
        let clips = [clip(0, 9.8), clip(1, 10.2)];
        let plan = AssemblyPlan::build(&clips, 10.0, 0.5).unwrap();
        let encoding = OutputEncoding::default();

        let (graph, video) = plan.filter_graph(&encoding, true);
        assert_eq!(video, "vx1");
        assert!(graph.contains("xfade=transition=fade:duration=0.500:offset=9.500[vx1]"));
        assert!(graph.contains("[ax1]loudnorm=I=-16:TP=-1.5:LRA=11,aresample=44100[aout]"));
        assert!(!graph.contains(";;"));

        let (plain, _) = plan.filter_graph(&encoding, false);
        assert!(!plain.contains("loudnorm"));
        assert!(plain.ends_with("[ax1]anull[aout]"));
    }

    #[test]
    fn test_command_loops_short_clips() {
        let clips = [clip(0, 9.8), clip(1, 10.2)];
        let plan = AssemblyPlan::build(&clips, 10.0, 0.5).unwrap();
        let args = plan
            .command(
                &OutputEncoding::default(),
                "vx1",
                Path::new("/tmp/graph.txt"),
                Path::new("/out/haunted.mp4"),
            )
            .build_args();

        let first = args.iter().position(|a| a == "/work/scene_0.mp4").unwrap();
        assert_eq!(args[first - 5..first], ["-stream_loop", "-1", "-t", "10.000", "-i"]);
        let second = args.iter().position(|a| a == "/work/scene_1.mp4").unwrap();
        assert_eq!(args[second - 3..second], ["-t", "10.000", "-i"]);

        assert!(args.iter().any(|a| a == "-filter_complex_script"));
        assert!(args.iter().any(|a| a == "[vx1]"));
        assert!(args.iter().any(|a| a == "19.500"));
    }

    #[test]
    fn test_request_for_scenes() {
        let request = AssemblyRequest::for_scenes([2, 0], Path::new("/work"), 10.0, 0.5, "/out/x.mp4");
        assert_eq!(
            request.clips,
            [
                ClipSource::new(2, "/work/scene_2.mp4"),
                ClipSource::new(0, "/work/scene_0.mp4"),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_clips_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out").join("haunted.mp4");
        let request = AssemblyRequest::for_scenes(0..3, dir.path(), 10.0, 0.5, &output);

        let err = Assembler::default().assemble(&request).await.unwrap_err();

        assert!(matches!(err, AssemblyError::NoClips));
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_assemble_synthetic_clips() {
        let dir = TempDir::new().unwrap();
        let runner = FfmpegRunner::new();

        for (i, length) in [9.8, 10.2, 10.0].into_iter().enumerate() {
            let cmd = FfmpegCommand::new(dir.path().join(scene_clip_name(i)))
                .input_with_args(
                    ["-f".to_string(), "lavfi".to_string()],
                    format!("testsrc=duration={}:size=320x240:rate=20", length),
                )
                .input_with_args(
                    ["-f".to_string(), "lavfi".to_string()],
                    format!("sine=frequency=220:duration={}", length),
                )
                .video_codec("libx264")
                .audio_codec("aac");
            runner.run(&cmd).await.unwrap();
        }

        let output = dir.path().join("final").join("test.mp4");
        let request = AssemblyRequest::for_scenes(0..4, dir.path(), 10.0, 0.5, &output);
        let report = Assembler::default().assemble(&request).await.unwrap();

        assert_eq!(report.clips_used, [0, 1, 2]);
        assert_eq!(report.skipped, [3]);

        let info = probe_media(&output).await.unwrap();
        assert!((info.duration - 29.0).abs() < 0.2, "duration {}", info.duration);
    }
}
