//! Storage path scheme.
//!
//! These layouts are shared with data already in the store and with the
//! executor, so they must not change:
//!
//! ```text
//! /Backend_files/Queued_Jobs/<backend>/job-<jobId>.json
//! /Backend_files/Running_Jobs/job-<jobId>.json
//! /Backend_files/Status/<backend>/<user>/status-<jobId>.json
//! /Backend_files/Result/<backend>/<user>/result-<jobId>.json
//! /Backend_files/Finished_Jobs/<backend>/<user>/job-<jobId>.json
//! ```

use crate::job_id::JobId;

pub const ROOT: &str = "/Backend_files";

const JOB_PREFIX: &str = "job-";
const STATUS_PREFIX: &str = "status-";
const RESULT_PREFIX: &str = "result-";
const EXTENSION: &str = ".json";

/// Directory of jobs waiting on `backend`.
pub fn queued_dir(backend: &str) -> String {
    format!("{ROOT}/Queued_Jobs/{backend}/")
}

/// Directory of claimed jobs, shared by all backends.
pub fn running_dir() -> String {
    format!("{ROOT}/Running_Jobs/")
}

/// Directory of `user`'s finished jobs on `backend`.
pub fn finished_dir(backend: &str, user: &str) -> String {
    format!("{ROOT}/Finished_Jobs/{backend}/{user}/")
}

/// Entry name of a job payload file: `job-<id>.json`.
pub fn job_file_name(id: &JobId) -> String {
    format!("{JOB_PREFIX}{id}{EXTENSION}")
}

pub fn queued_path(id: &JobId) -> String {
    format!("{}{}", queued_dir(id.backend()), job_file_name(id))
}

pub fn running_path(id: &JobId) -> String {
    format!("{}{}", running_dir(), job_file_name(id))
}

pub fn finished_path(id: &JobId) -> String {
    format!("{}{}", finished_dir(id.backend(), id.user()), job_file_name(id))
}

pub fn status_path(id: &JobId) -> String {
    format!(
        "{ROOT}/Status/{}/{}/{STATUS_PREFIX}{id}{EXTENSION}",
        id.backend(),
        id.user()
    )
}

pub fn result_path(id: &JobId) -> String {
    format!(
        "{ROOT}/Result/{}/{}/{RESULT_PREFIX}{id}{EXTENSION}",
        id.backend(),
        id.user()
    )
}

/// Strip the `job-` / `.json` wrapper from an entry name, yielding the raw id.
pub fn bare_job_id(entry_name: &str) -> Option<&str> {
    entry_name
        .strip_prefix(JOB_PREFIX)?
        .strip_suffix(EXTENSION)
}

/// Parse a `job-<id>.json` entry name into a [`JobId`].
pub fn parse_job_file_name(entry_name: &str) -> Option<JobId> {
    bare_job_id(entry_name).and_then(|raw| JobId::parse(raw).ok())
}
