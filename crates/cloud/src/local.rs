//! Local filesystem storage provider.
//!
//! Storage paths map onto files below a root directory. `move_object` is a
//! `rename(2)`, so of several processes moving the same source exactly one
//! succeeds and the rest see `NotFound`. The destination-occupied check
//! before the rename is best effort; the queue never moves two different
//! sources onto the same destination, so it does not depend on it.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use qspool_core::storage::{StorageBackend, StorageError};
use rand::Rng;

/// Staged writes are hidden files. Job, status and result entries never
/// start with a dot, so listings skip anything that does.
const STAGING_PREFIX: &str = ".staging-";

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage path onto the filesystem, refusing anything that
    /// could escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::Backend(format!("refusing path {path}")));
        }
        Ok(self.root.join(relative))
    }

    /// Write `content` to a uniquely named sibling of `target` and return
    /// the temporary path.
    async fn stage(&self, target: &Path, content: &[u8]) -> Result<PathBuf, StorageError> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(target, e))?;
        }
        let staged = target.with_file_name(format!(
            "{STAGING_PREFIX}{:016x}",
            rand::rng().random::<u64>()
        ));
        tokio::fs::write(&staged, content)
            .await
            .map_err(|e| io_error(&staged, e))?;
        Ok(staged)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    let shown = path.display().to_string();
    match err.kind() {
        ErrorKind::NotFound => StorageError::NotFound(shown),
        ErrorKind::AlreadyExists => StorageError::Conflict(shown),
        _ => StorageError::Backend(format!("{shown}: {err}")),
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, path: &str, content: Vec<u8>) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        let staged = self.stage(&target, &content).await?;
        tokio::fs::rename(&staged, &target)
            .await
            .map_err(|e| io_error(&target, e))
    }

    async fn put_new(&self, path: &str, content: Vec<u8>) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        let staged = self.stage(&target, &content).await?;
        // Linking fails if the target exists, which makes creation atomic.
        let linked = tokio::fs::hard_link(&staged, &target).await;
        let _ = tokio::fs::remove_file(&staged).await;
        linked.map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StorageError::Conflict(path.to_string()),
            _ => io_error(&target, e),
        })
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve(path)?;
        tokio::fs::read(&target).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => io_error(&target, e),
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.resolve(prefix)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_file && !name.starts_with('.') {
                names.push(name);
            }
        }
        Ok(names)
    }

    async fn move_object(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let from = self.resolve(src)?;
        let to = self.resolve(dst)?;
        if tokio::fs::try_exists(&to).await.map_err(|e| io_error(&to, e))? {
            return Err(StorageError::Conflict(dst.to_string()));
        }
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        tokio::fs::rename(&from, &to).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(src.to_string()),
            _ => io_error(&from, e),
        })
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => io_error(&target, e),
        })
    }
}
