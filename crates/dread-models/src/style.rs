//! Visual style of rendered scenes: subtitle look and the slow zoom.

use serde::{Deserialize, Serialize};

/// Subtitle appearance, expressed in ASS `force_style` terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    /// ASS colour, `&HAABBGGRR`
    pub primary_colour: String,
    /// ASS colour, `&HAABBGGRR`
    pub back_colour: String,
    pub outline: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 16,
            primary_colour: "&H00FFFFFF".to_string(),
            back_colour: "&H80000000".to_string(),
            outline: 1,
        }
    }
}

impl SubtitleStyle {
    /// Render as the value of the `subtitles` filter's `force_style` option.
    pub fn force_style(&self) -> String {
        format!(
            "FontName={},FontSize={},PrimaryColour={},BackColour={},Outline={}",
            self.font_name, self.font_size, self.primary_colour, self.back_colour, self.outline
        )
    }
}

/// Slow zoom applied to the still image of each scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KenBurns {
    /// Zoom increment per output frame
    pub step: f64,
    /// Maximum zoom factor
    pub max_zoom: f64,
}

impl Default for KenBurns {
    fn default() -> Self {
        Self {
            step: 0.001,
            max_zoom: 1.3,
        }
    }
}
