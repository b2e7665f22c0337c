#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for scene rendering and final assembly.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - FFprobe media inspection
//! - SubRip subtitle generation timed to narration
//! - Silent audio and placeholder frame synthesis
//! - Per-scene render and cross-faded assembly of rendered scenes

pub mod assembly;
pub mod audio;
pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod render;
pub mod still;
pub mod subtitle;

pub use assembly::{
    check_transition, Assembler, AssemblyError, AssemblyPlan, AssemblyReport, AssemblyRequest, ClipSource,
    DurationFix, LoadedClip, NormalizationWarning,
};
pub use audio::{measure_duration, write_silent_wav};
pub use command::{check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{get_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use render::{FfmpegSceneRenderer, RenderSettings, SceneRenderRequest, SceneRenderer};
pub use still::write_blank_frame;
pub use subtitle::{build_cues, to_srt, write_srt, SubtitleCue};
