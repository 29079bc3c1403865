//! Job lifecycle and queueing protocol over a generic object store.
//!
//! - [`queue`] -- submit, claim, status, result and listing operations.
//! - [`executor`] -- ordered status/result writes for the spooler side.
//! - [`storage`] -- the storage provider trait and an in-memory provider.
//! - [`job_id`], [`status`], [`paths`] -- data model and path scheme.

pub mod error;
pub mod executor;
pub mod job_id;
pub mod naming;
pub mod paths;
pub mod queue;
pub mod status;
pub mod storage;
