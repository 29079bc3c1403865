//! Concrete storage providers for the job queue.
//!
//! - [`local::LocalStorage`] -- files below a root directory.
//! - [`s3::S3Storage`] -- an S3 bucket (moves are not atomic).
//! - [`config`] -- environment-driven provider selection.

pub mod config;
pub mod local;
pub mod s3;

pub use config::{build_storage, CloudError, StorageConfig};
