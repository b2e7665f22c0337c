//! Image, music and speech generation for DreadReel scenes.
//!
//! This crate provides:
//! - Generator traits the pipeline depends on
//! - A Hugging Face text-to-image client and an HTTP placeholder source
//! - A fal.ai queue client for background music
//! - An `edge-tts` subprocess wrapper for narration
//! - Prompt and speech-rate helpers

pub mod error;
pub mod http;
pub mod music;
pub mod prompt;
pub mod speech;
pub mod traits;
pub mod visual;

pub use error::{GenerationError, GenerationResult};
pub use http::{build_client, ensure_image};
pub use music::FalMusicClient;
pub use prompt::{image_prompt, music_duration, music_prompt, truncate_narration, SpeechRate};
pub use speech::EdgeTtsCli;
pub use traits::{ImageGenerator, MusicGenerator, PlaceholderSource, SpeechSynthesizer};
pub use visual::{HttpPlaceholder, HuggingFaceImageClient};
