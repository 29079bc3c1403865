use crate::storage::StorageError;

/// Domain error returned by every queue operation.
///
/// The gateway maps each variant to its own HTTP status, so a missing job
/// and an unreachable storage provider never collapse into one answer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Map a storage failure on `path` into the domain taxonomy, naming the
    /// entity that lives at that path.
    pub fn from_storage(entity: &'static str, id: impl Into<String>, err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => CoreError::NotFound {
                entity,
                id: id.into(),
            },
            StorageError::Conflict(path) => {
                CoreError::Conflict(format!("{entity} already exists at {path}"))
            }
            StorageError::Backend(msg) => CoreError::Storage(msg),
        }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => CoreError::NotFound {
                entity: "Object",
                id: path,
            },
            StorageError::Conflict(path) => {
                CoreError::Conflict(format!("Object already exists at {path}"))
            }
            StorageError::Backend(msg) => CoreError::Storage(msg),
        }
    }
}
