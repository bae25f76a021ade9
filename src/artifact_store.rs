// src/artifact_store.rs
//! Transient file storage for uploaded inputs and downloaded outputs.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the managed directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Resolve a caller-supplied name to a path inside the managed directory.
    ///
    /// Only the final path component is kept, so names like `../x.mp4`
    /// cannot escape the directory.
    pub fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        let file_name = Self::file_name_of(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("invalid artifact name: {name:?}"))
        })?;
        Ok(self.root.join(file_name))
    }

    /// The component `path_for` would store `name` under, or `None` when the
    /// name has no usable file name (`..`, `/`, empty).
    pub fn file_name_of(name: &str) -> Option<&OsStr> {
        Path::new(name).file_name().filter(|n| !n.is_empty())
    }

    /// Persist `bytes` under `name`, replacing any previous artifact of that name.
    pub async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(name)?;
        self.ensure_dir().await?;

        let mut file = fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "artifact written");
        Ok(path)
    }

    pub async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }

    /// Remove an artifact. Failures (including a missing file) are logged, never raised.
    pub async fn delete(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => tracing::info!("🗑️ Cleaned up temporary file: {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Artifact already gone: {}", path.display());
            }
            Err(e) => tracing::error!("Error cleaning up file {}: {}", path.display(), e),
        }
    }

    /// Delete every file in the managed directory, returning how many were removed.
    pub async fn sweep_all(&self) -> usize {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Error reading artifact directory {}: {}", self.root.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Error listing artifact directory: {}", e);
                    break;
                }
            };

            let path = entry.path();
            match entry.file_type().await {
                Ok(kind) if kind.is_file() || kind.is_symlink() => {}
                _ => continue,
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    tracing::info!("Cleaned up old file: {}", path.display());
                }
                Err(e) => tracing::error!("Error deleting file {}: {}", path.display(), e),
            }
        }
        removed
    }

    /// Run `sweep_all` on a fixed interval in the background.
    ///
    /// The first tick fires after one full interval; the startup sweep is the
    /// caller's job.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                ticker.tick().await;
                let removed = store.sweep_all().await;
                tracing::debug!("🧹 Periodic artifact sweep removed {} file(s)", removed);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let path = store.write("clip.mp4", b"video-bytes").await.unwrap();
        assert_eq!(path, dir.path().join("clip.mp4"));
        assert_eq!(store.read(&path).await.unwrap(), b"video-bytes");
    }

    #[tokio::test]
    async fn test_write_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested").join("uploads"));

        let path = store.write("a.jpg", b"x").await.unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_path_for_strips_directories() {
        let store = ArtifactStore::new("/srv/uploads");
        assert_eq!(
            store.path_for("../../etc/passwd").unwrap(),
            PathBuf::from("/srv/uploads/passwd")
        );
        assert!(store.path_for("..").is_err());
        assert!(store.path_for("").is_err());
    }

    #[tokio::test]
    async fn test_delete_twice_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store.write("once.png", b"data").await.unwrap();

        store.delete(&path).await;
        assert!(!path.exists());
        store.delete(&path).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sweep_all_removes_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write("one.jpg", b"1").await.unwrap();
        store.write("two.mp4", b"2").await.unwrap();
        std::fs::create_dir(dir.path().join("keep")).unwrap();

        assert_eq!(store.sweep_all().await, 2);
        let remaining: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_missing_directory_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("does-not-exist"));
        assert_eq!(store.sweep_all().await, 0);
    }
}
