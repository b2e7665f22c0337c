//! Scene script document and validation.
//!
//! A script arrives as loosely-structured JSON (usually pasted from a chat
//! model). Validation never drops scenes: blank or too-short fields are
//! replaced by fixed defaults so every scene can still be rendered.

use std::fmt;
use std::ops::RangeInclusive;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Narration used when a scene's narration is missing or too short.
pub const DEFAULT_NARRATION: &str =
    "A restless spirit haunts the cursed shrine in eternal darkness.";
/// Visual prompt used when a scene has none.
pub const DEFAULT_VISUAL: &str = "A misty shrine under moonlight with a ghostly figure.";
/// Mood used when a scene has none.
pub const DEFAULT_MOOD: &str = "eerie";

/// Narrations with fewer words than this are replaced.
pub const MIN_NARRATION_WORDS: usize = 10;

/// Scene counts outside this range only produce a warning.
pub const EXPECTED_SCENE_COUNT: RangeInclusive<usize> = 50..=65;

/// Errors raised when the script document has the wrong shape.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid JSON structure - missing 'scenes' key")]
    MissingScenes,

    #[error("'scenes' must be an array")]
    ScenesNotArray,

    #[error("Scene {index} must be an object")]
    SceneNotObject { index: usize },

    #[error("Script contains no scenes")]
    NoScenes,
}

/// One scene of the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Text spoken by the narrator
    pub narration: String,
    /// Prompt for the scene illustration
    pub visual: String,
    /// Mood keyword driving the background music
    pub mood: String,
}

/// A validated scene script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    /// Scenes in playback order
    pub scenes: Vec<Scene>,
}

/// Scene field names, used when reporting substitutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneField {
    Narration,
    Visual,
    Mood,
}

impl fmt::Display for SceneField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneField::Narration => write!(f, "narration"),
            SceneField::Visual => write!(f, "visual"),
            SceneField::Mood => write!(f, "mood"),
        }
    }
}

/// What validation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of scenes in the script
    pub scene_count: usize,
    /// (scene index, field) pairs that were replaced by defaults
    pub substitutions: Vec<(usize, SceneField)>,
}

impl ValidationReport {
    /// Whether the scene count lies in the expected range.
    pub fn scene_count_in_range(&self) -> bool {
        EXPECTED_SCENE_COUNT.contains(&self.scene_count)
    }
}

impl Script {
    /// Parse and validate a script from JSON text.
    pub fn from_json(json: &str) -> Result<(Self, ValidationReport), SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        Self::validate_value(value)
    }

    /// Validate an already-parsed document, substituting defaults where needed.
    pub fn validate_value(value: Value) -> Result<(Self, ValidationReport), SchemaError> {
        let Value::Object(mut root) = value else {
            return Err(SchemaError::MissingScenes);
        };
        let scenes = match root.remove("scenes") {
            Some(Value::Array(scenes)) => scenes,
            Some(_) => return Err(SchemaError::ScenesNotArray),
            None => return Err(SchemaError::MissingScenes),
        };

        let mut report = ValidationReport {
            scene_count: scenes.len(),
            ..Default::default()
        };

        if !report.scene_count_in_range() {
            warn!(
                scenes = report.scene_count,
                "Provided {} scenes, expected {}-{}",
                report.scene_count,
                EXPECTED_SCENE_COUNT.start(),
                EXPECTED_SCENE_COUNT.end()
            );
        }

        if scenes.is_empty() {
            return Err(SchemaError::NoScenes);
        }

        let scenes = scenes
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(fields) => Ok(normalize_scene(index, &fields, &mut report)),
                _ => Err(SchemaError::SceneNotObject { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((Self { scenes }, report))
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the script has no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// JSON schema of the script document, handy for prompting a script writer.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Script)
    }
}

fn normalize_scene(index: usize, fields: &Map<String, Value>, report: &mut ValidationReport) -> Scene {
    let mut take = |field: SceneField, accept: fn(&str) -> bool, default: &str| {
        match fields.get(&field.to_string()).and_then(Value::as_str) {
            Some(text) if accept(text) => text.to_string(),
            _ => {
                report.substitutions.push((index, field));
                default.to_string()
            }
        }
    };

    Scene {
        narration: take(SceneField::Narration, narration_is_usable, DEFAULT_NARRATION),
        visual: take(SceneField::Visual, is_not_blank, DEFAULT_VISUAL),
        mood: take(SceneField::Mood, is_not_blank, DEFAULT_MOOD),
    }
}

fn is_not_blank(text: &str) -> bool {
    !text.trim().is_empty()
}

fn narration_is_usable(text: &str) -> bool {
    text.split_whitespace().count() >= MIN_NARRATION_WORDS
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TWELVE_WORDS: &str =
        "The lantern flickered twice before the cold hand closed around my wrist.";

    #[test]
    fn test_short_narration_replaced() {
        let doc = json!({"scenes": [{"narration": "hi", "visual": "a well", "mood": "dread"}]});
        let (script, report) = Script::validate_value(doc).unwrap();

        assert_eq!(script.scenes[0].narration, DEFAULT_NARRATION);
        assert_eq!(script.scenes[0].visual, "a well");
        assert_eq!(report.substitutions, vec![(0, SceneField::Narration)]);
    }

    #[test]
    fn test_valid_narration_kept() {
        assert_eq!(TWELVE_WORDS.split_whitespace().count(), 12);
        let doc = json!({"scenes": [{"narration": TWELVE_WORDS, "visual": "a well", "mood": "dread"}]});
        let (script, report) = Script::validate_value(doc).unwrap();

        assert_eq!(script.scenes[0].narration, TWELVE_WORDS);
        assert!(report.substitutions.is_empty());
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let doc = json!({"scenes": [{"visual": "   ", "mood": 3}]});
        let (script, report) = Script::validate_value(doc).unwrap();

        assert_eq!(
            script.scenes[0],
            Scene {
                narration: DEFAULT_NARRATION.to_string(),
                visual: DEFAULT_VISUAL.to_string(),
                mood: DEFAULT_MOOD.to_string(),
            }
        );
        assert_eq!(report.substitutions.len(), 3);
    }

    #[test]
    fn test_scenes_never_dropped() {
        let scenes: Vec<_> = (0..7).map(|_| json!({})).collect();
        let (script, report) = Script::validate_value(json!({ "scenes": scenes })).unwrap();

        assert_eq!(script.len(), 7);
        assert_eq!(report.scene_count, 7);
        assert!(!report.scene_count_in_range());
    }

    #[test]
    fn test_schema_errors() {
        assert!(matches!(
            Script::validate_value(json!([1, 2])),
            Err(SchemaError::MissingScenes)
        ));
        assert!(matches!(
            Script::validate_value(json!({"story": []})),
            Err(SchemaError::MissingScenes)
        ));
        assert!(matches!(
            Script::validate_value(json!({"scenes": "one"})),
            Err(SchemaError::ScenesNotArray)
        ));
        assert!(matches!(
            Script::validate_value(json!({"scenes": [{}, 4]})),
            Err(SchemaError::SceneNotObject { index: 1 })
        ));
        assert!(matches!(
            Script::validate_value(json!({"scenes": []})),
            Err(SchemaError::NoScenes)
        ));
        assert!(matches!(
            Script::from_json("{not json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let text = format!(
            r#"{{"scenes": [{{"narration": "{}", "visual": "torii gate", "mood": "ominous"}}]}}"#,
            TWELVE_WORDS
        );
        let (script, report) = Script::from_json(&text).unwrap();
        assert_eq!(script.scenes[0].mood, "ominous");
        assert!(report.substitutions.is_empty());
    }

    #[test]
    fn test_json_schema_names_fields() {
        let schema = serde_json::to_string(&Script::json_schema()).unwrap();
        assert!(schema.contains("narration"));
        assert!(schema.contains("visual"));
        assert!(schema.contains("mood"));
    }
}
