//! SubRip subtitles timed to the narration.
//!
//! Each sentence of the narration becomes one cue. The measured length of
//! the narration audio is divided evenly across sentences, and no cue runs
//! past 90% of the scene so the text clears before the cross-fade.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MediaResult;
use crate::fs_utils::write_atomic;

/// Soft line width for wrapped subtitle text.
pub const SUBTITLE_LINE_WIDTH: usize = 40;

/// Share of the scene that subtitles may occupy.
pub const SUBTITLE_WINDOW_RATIO: f64 = 0.9;

/// One time-coded subtitle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// 1-based cue number
    pub index: usize,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Cue text, possibly spanning several lines
    pub text: String,
}

impl SubtitleCue {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Split narration into sentences on periods.
///
/// Empty fragments are dropped; text without any sentence content becomes a
/// single sentence (or nothing when it is blank).
pub fn split_sentences(narration: &str) -> Vec<String> {
    let sentences: Vec<String> = narration
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if sentences.is_empty() {
        let whole = narration.trim();
        if whole.is_empty() {
            return Vec::new();
        }
        return vec![whole.to_string()];
    }

    sentences
}

/// Greedy word wrap; a word joins the current line while `len + word + 1 <= width`.
pub fn wrap_text(sentence: &str, width: usize) -> String {
    if sentence.chars().count() <= width {
        return sentence.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for word in sentence.split_whitespace() {
        let word_len = word.chars().count();
        if current_len + word_len + 1 <= width || current.is_empty() {
            current.push(word);
            current_len += word_len + 1;
        } else {
            lines.push(current.join(" "));
            current = vec![word];
            current_len = word_len + 1;
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    lines.join("\n")
}

/// Build cues for one scene.
///
/// `measured` is the narration audio length; when it is unknown or not
/// positive, 90% of the scene is used instead.
pub fn build_cues(narration: &str, measured: Option<f64>, scene_duration: f64) -> Vec<SubtitleCue> {
    let window = scene_duration * SUBTITLE_WINDOW_RATIO;
    let spoken = match measured {
        Some(seconds) if seconds > 0.0 => seconds,
        _ => window,
    };

    let sentences = split_sentences(narration);
    let per_sentence = spoken / sentences.len().max(1) as f64;

    sentences
        .into_iter()
        .enumerate()
        .map(|(i, sentence)| SubtitleCue {
            index: i + 1,
            start: (i as f64 * per_sentence).min(window),
            end: ((i + 1) as f64 * per_sentence).min(window),
            text: wrap_text(&sentence, SUBTITLE_LINE_WIDTH),
        })
        .collect()
}

/// Format seconds as `HH:MM:SS,mmm`.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let m = (total_sec / 60) % 60;
    let h = total_sec / 3600;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Render cues in SubRip format.
pub fn to_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_srt_time(cue.start),
            format_srt_time(cue.end),
            cue.text
        );
    }
    out
}

/// Write cues to an `.srt` file.
pub async fn write_srt(path: impl AsRef<Path>, cues: &[SubtitleCue]) -> MediaResult<()> {
    write_atomic(path, to_srt(cues).as_bytes()).await
}
