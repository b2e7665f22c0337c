//! Narration through the `edge-tts` command line tool.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{GenerationError, GenerationResult};
use crate::prompt::{truncate_narration, SpeechRate};
use crate::traits::SpeechSynthesizer;

/// Default narrator voice.
pub const DEFAULT_TTS_VOICE: &str = "en-US-AriaNeural";

const SERVICE: &str = "speech synthesizer";

/// Runs `edge-tts` once per narration and reads back the MP3 it writes.
#[derive(Debug, Clone)]
pub struct EdgeTtsCli {
    program: PathBuf,
    voice: String,
    timeout: Option<Duration>,
}

impl EdgeTtsCli {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            program: PathBuf::from("edge-tts"),
            voice: voice.into(),
            timeout: None,
        }
    }

    /// Use a different executable (absolute path or name on `PATH`).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for EdgeTtsCli {
    fn default() -> Self {
        Self::new(DEFAULT_TTS_VOICE)
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsCli {
    async fn synthesize(&self, text: &str, rate: SpeechRate) -> GenerationResult<Vec<u8>> {
        let program = which::which(&self.program)
            .map_err(|_| GenerationError::process(self.program_name(), "not found in PATH"))?;

        let media = tempfile::Builder::new()
            .prefix("dread_voice_")
            .suffix(".mp3")
            .tempfile()?;

        debug!(voice = %self.voice, rate = %rate.as_arg(), "Synthesizing narration");
        let child = Command::new(&program)
            .arg("--voice")
            .arg(&self.voice)
            .arg(format!("--rate={}", rate.as_arg()))
            .arg(format!("--text={}", truncate_narration(text)))
            .arg("--write-media")
            .arg(media.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!("{} timed out after {:?}", self.program_name(), limit);
                    return Err(GenerationError::Timeout {
                        service: SERVICE,
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GenerationError::process(
                self.program_name(),
                format!("exit code {:?}: {}", output.status.code(), stderr),
            ));
        }

        let audio = tokio::fs::read(media.path()).await?;
        if audio.is_empty() {
            return Err(GenerationError::EmptyOutput { service: SERVICE });
        }
        Ok(audio)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_tts(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    // Both scripts run from one test so no other fork can inherit a
    // script's write handle while it is being executed.
    #[tokio::test]
    async fn test_fake_edge_tts() {
        let dir = TempDir::new().unwrap();
        let writes = fake_tts(
            &dir,
            "tts-ok",
            r#"args="$*"
while [ $# -gt 0 ]; do
  if [ "$1" = "--write-media" ]; then printf '%s' "$args" > "$2"; fi
  shift
done"#,
        );
        let silent = fake_tts(&dir, "tts-empty", "exit 0");
        let failing = fake_tts(&dir, "tts-fail", "echo 'no route to host' >&2; exit 3");

        let tts = EdgeTtsCli::default().with_program(&writes);
        let audio = tts
            .synthesize("The lantern went out.", SpeechRate::for_scene_duration(10.0))
            .await
            .unwrap();
        let args = String::from_utf8(audio).unwrap();
        assert!(args.contains("--voice en-US-AriaNeural"));
        assert!(args.contains("--rate=-30%"));
        assert!(args.contains("--text=The lantern went out."));

        // A leading dash stays part of the text instead of reading as a flag
        let audio = tts
            .synthesize("-- nobody answered.", SpeechRate::for_scene_duration(10.0))
            .await
            .unwrap();
        let args = String::from_utf8(audio).unwrap();
        assert!(args.contains("--text=-- nobody answered. --write-media"));

        let err = EdgeTtsCli::default()
            .with_program(&silent)
            .synthesize("x", SpeechRate::percent(-30))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyOutput { .. }));

        let err = EdgeTtsCli::default()
            .with_program(&failing)
            .synthesize("x", SpeechRate::percent(-30))
            .await
            .unwrap_err();
        match err {
            GenerationError::Process { message, .. } => assert!(message.contains("no route to host")),
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = EdgeTtsCli::default()
            .with_program("/nonexistent/edge-tts")
            .synthesize("x", SpeechRate::percent(-30))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Process { .. }));
    }
}
