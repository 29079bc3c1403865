//! Object-storage seam consumed by the job queue.
//!
//! Every piece of queue state lives behind [`StorageBackend`]: the queue
//! itself holds no coordination state in memory. The only concurrency
//! guarantee the queue relies on is that [`StorageBackend::move_object`] is
//! atomic and fails when its source is already gone. Providers that cannot
//! promise that must document it.

pub mod memory;

use async_trait::async_trait;

pub use memory::MemoryStorage;

/// Failure reported by a storage provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Nothing is stored at the path.
    #[error("no object at {0}")]
    NotFound(String),

    /// The destination of a create-only write or move is already occupied.
    #[error("object already exists at {0}")]
    Conflict(String),

    /// The provider could not be reached or refused the request.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Path-addressed blob store.
///
/// Paths are absolute, `/`-separated strings such as
/// `/Backend_files/Running_Jobs/job-<id>.json`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short provider name for logs and health output.
    fn name(&self) -> &'static str;

    /// Write `content` at `path`, replacing any existing object.
    async fn put(&self, path: &str, content: Vec<u8>) -> Result<(), StorageError>;

    /// Write `content` at `path` only if nothing is stored there yet.
    ///
    /// Fails with [`StorageError::Conflict`] when the path is occupied.
    async fn put_new(&self, path: &str, content: Vec<u8>) -> Result<(), StorageError>;

    /// Read the object at `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// List the entry names (not full paths) directly below `prefix`.
    ///
    /// A prefix with nothing below it lists as empty. No ordering is
    /// guaranteed.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Move the object at `src` to `dst`.
    ///
    /// Must fail with [`StorageError::NotFound`] if `src` no longer exists
    /// and with [`StorageError::Conflict`] if `dst` is occupied.
    async fn move_object(&self, src: &str, dst: &str) -> Result<(), StorageError>;

    /// Remove the object at `path`.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}
