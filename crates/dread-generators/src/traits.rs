//! Generator seams.
//!
//! Each generator returns the produced bytes; writing them to the artifact
//! cache is the caller's job.

use async_trait::async_trait;

use crate::error::GenerationResult;
use crate::prompt::SpeechRate;

/// Text-to-image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Encoded image bytes (PNG, JPEG, ...) for `prompt`.
    async fn generate(&self, prompt: &str) -> GenerationResult<Vec<u8>>;
}

/// Fixed stand-in image used when generation fails.
#[async_trait]
pub trait PlaceholderSource: Send + Sync {
    async fn fetch(&self) -> GenerationResult<Vec<u8>>;
}

/// Text-to-audio for background music.
#[async_trait]
pub trait MusicGenerator: Send + Sync {
    /// Audio bytes of roughly `duration_secs` seconds.
    async fn generate(&self, prompt: &str, duration_secs: u32) -> GenerationResult<Vec<u8>>;
}

/// Text-to-speech for narration.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Encoded speech (MP3) for `text`.
    async fn synthesize(&self, text: &str, rate: SpeechRate) -> GenerationResult<Vec<u8>>;
}
