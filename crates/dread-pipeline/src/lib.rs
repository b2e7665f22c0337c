//! DreadReel pipeline: scene generation, rendering and final assembly.
//!
//! A validated script flows through the [`SceneOrchestrator`] one scene at a
//! time; the rendered clips are then joined by the assembler into
//! `{output_dir}/{theme}.mp4`.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod run;

pub use artifacts::{discover_rendered_scenes, SceneArtifacts};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::SceneLogger;
pub use orchestrator::{Asset, AssetSource, Collaborators, SceneOrchestrator, SceneOutcome};
pub use run::{Pipeline, RunSummary};
