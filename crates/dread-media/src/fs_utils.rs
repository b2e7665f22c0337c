//! Filesystem utilities for artifact writes.
//!
//! Artifacts are written next to their final location under a `.part` name
//! and renamed into place, so an interrupted write never leaves a truncated
//! file at the path the next stage (or the next run's cache check) looks at.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Sibling path used while `path` is being produced: `scene_3.mp4` → `scene_3.part.mp4`.
pub fn partial_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}.part.{}", stem, ext.to_string_lossy()),
        None => format!("{}.part", stem),
    };
    path.with_file_name(name)
}

/// Create the parent directory of `path` if it does not exist.
pub async fn ensure_parent(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Write `data` to `path` via a partial file and rename.
pub async fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> MediaResult<()> {
    let path = path.as_ref();
    ensure_parent(path).await?;

    let tmp = partial_path(path);
    if let Err(e) = fs::write(&tmp, data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(MediaError::from(e));
    }

    finish_partial(&tmp, path).await
}

/// Rename a finished partial file onto its final path.
pub async fn finish_partial(tmp: &Path, path: &Path) -> MediaResult<()> {
    fs::rename(tmp, path).await.map_err(|e| {
        let _ = std::fs::remove_file(tmp);
        tracing::error!(
            "Failed to move {} into place at {}: {}",
            tmp.display(),
            path.display(),
            e
        );
        MediaError::from(e)
    })
}

/// Remove a leftover partial file, ignoring absence.
pub async fn discard_partial(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove partial file {}: {}", tmp.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/work/scene_3.mp4")),
            PathBuf::from("/work/scene_3.part.mp4")
        );
        assert_eq!(partial_path(Path::new("sub_0")), PathBuf::from("sub_0.part"));
    }

    #[tokio::test]
    async fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets").join("temp").join("scene_0.png");

        write_atomic(&path, b"png bytes").await.unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), b"png bytes");
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn test_write_atomic_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bgm_0.wav");

        write_atomic(&path, b"old").await.unwrap();
        write_atomic(&path, b"new").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "new");
    }
}
