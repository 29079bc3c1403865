use std::path::PathBuf;
use std::sync::Arc;

use qspool_core::storage::{MemoryStorage, StorageBackend};

use crate::local::LocalStorage;
use crate::s3::S3Storage;

/// Errors raised while selecting a storage provider.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("Unknown storage provider '{0}'. Must be one of: memory, local, s3")]
    UnknownProvider(String),

    #[error("{0} must be set for the {1} storage provider")]
    MissingSetting(&'static str, &'static str),
}

/// Which storage provider to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Local { root: PathBuf },
    S3 { bucket: String, prefix: String },
}

impl StorageConfig {
    /// Load the provider selection from environment variables.
    ///
    /// | Env Var              | Default  | Used by |
    /// |----------------------|----------|---------|
    /// | `STORAGE_PROVIDER`   | `local`  | all     |
    /// | `LOCAL_STORAGE_ROOT` | `./data` | `local` |
    /// | `S3_BUCKET`          | required | `s3`    |
    /// | `S3_PREFIX`          | empty    | `s3`    |
    pub fn from_env() -> Result<Self, CloudError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CloudError> {
        let provider = lookup("STORAGE_PROVIDER").unwrap_or_else(|| "local".into());
        match provider.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "local" => Ok(Self::Local {
                root: lookup("LOCAL_STORAGE_ROOT")
                    .unwrap_or_else(|| "./data".into())
                    .into(),
            }),
            "s3" => Ok(Self::S3 {
                bucket: lookup("S3_BUCKET")
                    .filter(|b| !b.trim().is_empty())
                    .ok_or(CloudError::MissingSetting("S3_BUCKET", "s3"))?,
                prefix: lookup("S3_PREFIX").unwrap_or_default(),
            }),
            other => Err(CloudError::UnknownProvider(other.to_string())),
        }
    }
}

/// Instantiate the configured provider.
pub async fn build_storage(config: &StorageConfig) -> Arc<dyn StorageBackend> {
    match config {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; jobs are lost on restart");
            Arc::new(MemoryStorage::new())
        }
        StorageConfig::Local { root } => {
            tracing::info!(root = %root.display(), "Using local filesystem storage");
            Arc::new(LocalStorage::new(root.clone()))
        }
        StorageConfig::S3 { bucket, prefix } => {
            tracing::warn!(
                bucket = %bucket,
                "Using S3 storage; object moves are not atomic, run one spooler per backend",
            );
            Arc::new(S3Storage::from_env(bucket.clone(), prefix).await)
        }
    }
}
