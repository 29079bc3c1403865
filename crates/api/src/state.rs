use std::sync::Arc;

use qspool_core::queue::JobQueue;

use crate::config::ServerConfig;
use crate::registry::Registry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the queue only holds a storage handle and everything else
/// sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Job lifecycle operations over the configured storage provider.
    pub queue: JobQueue,
    /// Known users and backends.
    pub registry: Arc<Registry>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
