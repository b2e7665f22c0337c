//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid script: {0}")]
    Schema(#[from] dread_models::SchemaError),

    #[error("Timing error: {0}")]
    Timing(#[from] dread_models::TimingError),

    #[error("Invalid theme: {0}")]
    Theme(#[from] dread_models::ThemeError),

    #[error("Generator setup failed: {0}")]
    Generation(#[from] dread_generators::GenerationError),

    #[error("Media error: {0}")]
    Media(#[from] dread_media::MediaError),

    #[error("Assembly failed: {0}")]
    Assembly(#[from] dread_media::AssemblyError),

    #[error("No rendered scenes found in {0}")]
    NothingToAssemble(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
