//! Prompts and parameters derived from scene content.

/// Style prefix for every image prompt.
pub const IMAGE_STYLE_PREFIX: &str = "Japanese watercolor horror style, ";

/// Classifier-free guidance used for image generation.
pub const IMAGE_GUIDANCE_SCALE: f64 = 12.5;

/// Longest music clip the sound generator accepts, in seconds.
pub const MAX_MUSIC_SECONDS: u32 = 30;

/// Narration beyond this many characters is not spoken.
pub const MAX_NARRATION_CHARS: usize = 500;

pub fn image_prompt(visual: &str) -> String {
    format!("{}{}", IMAGE_STYLE_PREFIX, visual)
}

pub fn music_prompt(mood: &str) -> String {
    format!("{} horror ambient using appropriate Japanese stringed instruments", mood)
}

/// Requested music length: the scene rounded up, capped at [`MAX_MUSIC_SECONDS`].
pub fn music_duration(scene_duration: f64) -> u32 {
    let seconds = scene_duration.max(0.0).ceil();
    if seconds >= MAX_MUSIC_SECONDS as f64 {
        MAX_MUSIC_SECONDS
    } else {
        seconds as u32
    }
}

/// First [`MAX_NARRATION_CHARS`] characters of the narration.
pub fn truncate_narration(narration: &str) -> &str {
    match narration.char_indices().nth(MAX_NARRATION_CHARS) {
        Some((end, _)) => &narration[..end],
        None => narration,
    }
}

/// Speaking rate relative to the voice's normal pace, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechRate(i32);

impl SpeechRate {
    pub const fn percent(value: i32) -> Self {
        Self(value)
    }

    /// Slower narration for longer scenes.
    pub fn for_scene_duration(scene_duration: f64) -> Self {
        if scene_duration < 9.0 {
            Self(-20)
        } else if scene_duration > 11.0 {
            Self(-40)
        } else {
            Self(-30)
        }
    }

    /// Signed form expected by edge-tts, e.g. `-30%`.
    pub fn as_arg(&self) -> String {
        format!("{:+}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        assert_eq!(
            image_prompt("A misty shrine"),
            "Japanese watercolor horror style, A misty shrine"
        );
        assert_eq!(
            music_prompt("eerie"),
            "eerie horror ambient using appropriate Japanese stringed instruments"
        );
    }

    #[test]
    fn test_music_duration() {
        assert_eq!(music_duration(10.0), 10);
        assert_eq!(music_duration(9.77), 10);
        assert_eq!(music_duration(45.0), 30);
        assert_eq!(music_duration(29.2), 30);
    }

    #[test]
    fn test_speech_rate_tiers() {
        assert_eq!(SpeechRate::for_scene_duration(8.5).as_arg(), "-20%");
        assert_eq!(SpeechRate::for_scene_duration(9.0).as_arg(), "-30%");
        assert_eq!(SpeechRate::for_scene_duration(10.0).as_arg(), "-30%");
        assert_eq!(SpeechRate::for_scene_duration(11.0).as_arg(), "-30%");
        assert_eq!(SpeechRate::for_scene_duration(11.5).as_arg(), "-40%");
        assert_eq!(SpeechRate::percent(10).as_arg(), "+10%");
    }

    #[test]
    fn test_truncate_narration() {
        let long = "é".repeat(600);
        assert_eq!(truncate_narration(&long).chars().count(), 500);
        assert_eq!(truncate_narration("short"), "short");
        let exact = "a".repeat(500);
        assert_eq!(truncate_narration(&exact), exact);
    }
}
