//! Per-scene artifact layout in the work directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use dread_media::assembly::scene_clip_name;
use dread_media::ClipSource;
use regex::Regex;
use tokio::fs;

static RENDERED_SCENE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^scene_(\d+)\.mp4$").unwrap());

/// Where every artifact of one scene lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneArtifacts {
    pub index: usize,
    /// Generated illustration (cache-gated)
    pub image: PathBuf,
    /// Placeholder or locally drawn frame
    pub fallback_image: PathBuf,
    /// Generated background music (cache-gated)
    pub bgm: PathBuf,
    /// Silent stand-in for music or narration
    pub silent_audio: PathBuf,
    /// Narration
    pub voice: PathBuf,
    pub subtitles: PathBuf,
    /// Rendered clip
    pub clip: PathBuf,
}

impl SceneArtifacts {
    pub fn new(work_dir: &Path, index: usize) -> Self {
        Self {
            index,
            image: work_dir.join(format!("scene_{}.png", index)),
            fallback_image: work_dir.join(format!("fallback_{}.png", index)),
            bgm: work_dir.join(format!("bgm_{}.wav", index)),
            silent_audio: work_dir.join(format!("silent_{}.wav", index)),
            voice: work_dir.join(format!("voice_{}.mp3", index)),
            subtitles: work_dir.join(format!("sub_{}.srt", index)),
            clip: work_dir.join(scene_clip_name(index)),
        }
    }
}

/// Rendered clips (`scene_<n>.mp4`) in `work_dir`, ordered by scene number.
pub async fn discover_rendered_scenes(work_dir: &Path) -> std::io::Result<Vec<ClipSource>> {
    let mut entries = fs::read_dir(work_dir).await?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(index) = RENDERED_SCENE
            .captures(name)
            .and_then(|c| c[1].parse::<usize>().ok())
        else {
            continue;
        };
        if entry.file_type().await?.is_file() {
            found.push(ClipSource::new(index, entry.path()));
        }
    }

    found.sort_by_key(|clip| clip.scene_index);
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_names() {
        let a = SceneArtifacts::new(Path::new("assets/temp"), 7);
        assert_eq!(a.image, PathBuf::from("assets/temp/scene_7.png"));
        assert_eq!(a.fallback_image, PathBuf::from("assets/temp/fallback_7.png"));
        assert_eq!(a.bgm, PathBuf::from("assets/temp/bgm_7.wav"));
        assert_eq!(a.silent_audio, PathBuf::from("assets/temp/silent_7.wav"));
        assert_eq!(a.voice, PathBuf::from("assets/temp/voice_7.mp3"));
        assert_eq!(a.subtitles, PathBuf::from("assets/temp/sub_7.srt"));
        assert_eq!(a.clip, PathBuf::from("assets/temp/scene_7.mp4"));
    }

    #[tokio::test]
    async fn test_discover_orders_numerically() {
        let dir = TempDir::new().unwrap();
        for name in [
            "scene_10.mp4",
            "scene_2.mp4",
            "scene_0.mp4",
            "scene_x.mp4",
            "scene_3.part.mp4",
            "scene_4.png",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("scene_5.mp4")).unwrap();

        let found = discover_rendered_scenes(dir.path()).await.unwrap();
        let indices: Vec<_> = found.iter().map(|c| c.scene_index).collect();
        assert_eq!(indices, [0, 2, 10]);
        assert_eq!(found[2].path, dir.path().join("scene_10.mp4"));
    }

    #[tokio::test]
    async fn test_discover_missing_dir() {
        assert!(discover_rendered_scenes(Path::new("/nonexistent/dread")).await.is_err());
    }
}
