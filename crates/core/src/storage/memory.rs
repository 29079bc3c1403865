//! In-process storage provider.
//!
//! Backs tests and single-node development. All operations run under one
//! async mutex, so `move_object` is a genuine compare-and-swap: exactly one
//! of several concurrent movers of the same source succeeds.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StorageBackend, StorageError};

#[derive(Default)]
struct Inner {
    objects: BTreeMap<String, Vec<u8>>,
    /// Any path starting with one of these prefixes fails with `Backend`.
    failing_prefixes: Vec<String>,
}

impl Inner {
    fn check(&self, path: &str) -> Result<(), StorageError> {
        if self.failing_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return Err(StorageError::Backend(format!("injected failure for {path}")));
        }
        Ok(())
    }
}

/// Storage provider keeping every object in memory.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
    moves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `move_object` calls so far.
    pub fn move_count(&self) -> usize {
        self.moves.load(Ordering::SeqCst)
    }

    /// Make every operation on a path under `prefix` fail with
    /// [`StorageError::Backend`]. An empty prefix takes the whole store offline.
    pub async fn inject_failure(&self, prefix: impl Into<String>) {
        self.inner.lock().await.failing_prefixes.push(prefix.into());
    }

    /// Drop all injected failures.
    pub async fn clear_failures(&self) {
        self.inner.lock().await.failing_prefixes.clear();
    }

    /// Whether an object is stored at `path`.
    pub async fn contains(&self, path: &str) -> bool {
        self.inner.lock().await.objects.contains_key(path)
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, path: &str, content: Vec<u8>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        inner.check(path)?;
        inner.objects.insert(path.to_string(), content);
        Ok(())
    }

    async fn put_new(&self, path: &str, content: Vec<u8>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        inner.check(path)?;
        if inner.objects.contains_key(path) {
            return Err(StorageError::Conflict(path.to_string()));
        }
        inner.objects.insert(path.to_string(), content);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let inner = self.inner.lock().await;
        inner.check(path)?;
        inner
            .objects
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.lock().await;
        inner.check(prefix)?;
        let dir = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };
        Ok(inner
            .objects
            .range(dir.clone()..)
            .take_while(|(key, _)| key.starts_with(&dir))
            .filter_map(|(key, _)| {
                let rest = &key[dir.len()..];
                (!rest.contains('/')).then(|| rest.to_string())
            })
            .collect())
    }

    async fn move_object(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        inner.check(src)?;
        inner.check(dst)?;
        if inner.objects.contains_key(dst) {
            return Err(StorageError::Conflict(dst.to_string()));
        }
        let content = inner
            .objects
            .remove(src)
            .ok_or_else(|| StorageError::NotFound(src.to_string()))?;
        inner.objects.insert(dst.to_string(), content);
        self.moves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        inner.check(path)?;
        inner
            .objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}
