//! The job queue engine.
//!
//! Jobs move between three storage locations: Queued (per backend), Running
//! (global) and Finished (per backend and user). The payload exists in
//! exactly one of them at a time and only ever moves, so "who owns this job"
//! is decided by whichever `move_object` call wins. The queue performs the
//! Queued -> Running move and writes the `INITIALIZING` status; every other
//! transition belongs to the executor (see [`crate::executor`]).

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::error::CoreError;
use crate::job_id::JobId;
use crate::naming::{validate_backend_name, validate_username};
use crate::paths;
use crate::status::{JobOutcome, JobStatus, StatusRecord};
use crate::storage::{StorageBackend, StorageError};

/// How many fresh suffixes `submit` draws before giving up on a collision.
pub const MAX_SUBMIT_ATTEMPTS: usize = 5;

/// A freshly accepted job.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub status: StatusRecord,
}

/// A job handed to the spooler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedJob {
    pub job_id: JobId,
    /// Storage path of the payload in the Running location.
    pub job_json: String,
    /// `true` when the job was already running and is handed out again
    /// rather than moved by this call.
    pub recovered: bool,
}

/// Job lifecycle operations over an injected storage provider.
///
/// Cheap to clone; holds no state besides the storage handle.
#[derive(Clone)]
pub struct JobQueue {
    storage: Arc<dyn StorageBackend>,
}

impl JobQueue {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Accept `payload` for `backend` on behalf of `user`.
    ///
    /// Writes the payload into the Queued location, then the `INITIALIZING`
    /// status record. The two writes are not transactional: if the second
    /// one fails the job stays queued without a status record and status
    /// queries answer `NotFound` until the executor writes one.
    pub async fn submit(
        &self,
        backend: &str,
        user: &str,
        payload: &[u8],
    ) -> Result<SubmittedJob, CoreError> {
        validate_backend_name(backend)?;
        validate_username(user)?;

        let text = std::str::from_utf8(payload).map_err(|_| {
            CoreError::Invalid("The encoding of your json seems non utf-8!".into())
        })?;
        serde_json::from_str::<serde::de::IgnoredAny>(text)
            .map_err(|e| CoreError::Invalid(format!("Job payload is not valid JSON: {e}")))?;

        let job_id = self.write_job_record(backend, user, payload).await?;

        let status = StatusRecord::submitted(job_id.to_string());
        let status_path = paths::status_path(&job_id);
        let body = encode(&status)?;
        if let Err(e) = self.storage.put(&status_path, body).await {
            tracing::error!(
                job_id = %job_id,
                path = %status_path,
                error = %e,
                "Job queued but its status record could not be written",
            );
            return Err(CoreError::from_storage("Status", job_id.to_string(), e));
        }

        tracing::info!(job_id = %job_id, backend, user, "Job submitted");
        Ok(SubmittedJob { job_id, status })
    }

    /// Create the job payload under a fresh id, redrawing the suffix on a
    /// (rare) collision.
    async fn write_job_record(
        &self,
        backend: &str,
        user: &str,
        payload: &[u8],
    ) -> Result<JobId, CoreError> {
        for attempt in 1..=MAX_SUBMIT_ATTEMPTS {
            let job_id = JobId::generate(backend, user, Utc::now())?;
            match self
                .storage
                .put_new(&paths::queued_path(&job_id), payload.to_vec())
                .await
            {
                Ok(()) => return Ok(job_id),
                Err(StorageError::Conflict(_)) => {
                    tracing::warn!(job_id = %job_id, attempt, "Job id collision, drawing a new suffix");
                }
                Err(e) => return Err(CoreError::from_storage("Job", job_id.to_string(), e)),
            }
        }
        Err(CoreError::Conflict(format!(
            "Could not allocate a unique job id after {MAX_SUBMIT_ATTEMPTS} attempts"
        )))
    }

    /// Hand the next job for `backend` to the spooler.
    ///
    /// First looks for a job of this backend that is already in Running and
    /// returns it unchanged: a spooler that crashed mid-job gets its job back
    /// instead of losing it. This assumes one active spooler per backend; a
    /// second one asking while a job runs receives that same job. Only when
    /// nothing is running does it take the oldest queued job (ordered by
    /// id, i.e. creation time) and move it to Running.
    ///
    /// Returns `Ok(None)` when the queue is empty, [`CoreError::Conflict`]
    /// when another claimer moved the chosen job first, and
    /// [`CoreError::Storage`] when the provider fails.
    pub async fn claim_next(&self, backend: &str) -> Result<Option<ClaimedJob>, CoreError> {
        validate_backend_name(backend)?;

        if let Some(job) = self.find_running(backend).await? {
            tracing::info!(job_id = %job.job_id, backend, "Handing out job that is already running");
            return Ok(Some(job));
        }

        let mut candidates: Vec<JobId> = self
            .storage
            .list(&paths::queued_dir(backend))
            .await?
            .iter()
            .filter_map(|name| parse_entry(name))
            .filter(|id| id.backend() == backend)
            .collect();
        candidates.sort();

        let Some(job_id) = candidates.into_iter().next() else {
            tracing::debug!(backend, "No queued job");
            return Ok(None);
        };

        let src = paths::queued_path(&job_id);
        let dst = paths::running_path(&job_id);
        match self.storage.move_object(&src, &dst).await {
            Ok(()) => {
                tracing::info!(job_id = %job_id, backend, "Job claimed");
                Ok(Some(ClaimedJob {
                    job_id,
                    job_json: dst,
                    recovered: false,
                }))
            }
            Err(StorageError::NotFound(_) | StorageError::Conflict(_)) => {
                tracing::warn!(job_id = %job_id, backend, "Lost claim race");
                Err(CoreError::Conflict(format!(
                    "Job {job_id} was claimed by another request"
                )))
            }
            Err(StorageError::Backend(msg)) => Err(CoreError::Storage(msg)),
        }
    }

    /// Oldest job of `backend` currently in the Running location.
    async fn find_running(&self, backend: &str) -> Result<Option<ClaimedJob>, CoreError> {
        let mut running: Vec<JobId> = self
            .storage
            .list(&paths::running_dir())
            .await?
            .iter()
            .filter_map(|name| parse_entry(name))
            .filter(|id| id.backend() == backend)
            .collect();
        running.sort();

        Ok(running.into_iter().next().map(|job_id| ClaimedJob {
            job_json: paths::running_path(&job_id),
            job_id,
            recovered: true,
        }))
    }

    /// Read the status record of `job_id` on `backend`.
    ///
    /// A malformed id, an id belonging to another backend and a missing
    /// record all answer [`CoreError::NotFound`].
    pub async fn get_status(&self, backend: &str, job_id: &str) -> Result<StatusRecord, CoreError> {
        let id = parse_for_backend(backend, job_id)?;
        let path = paths::status_path(&id);
        let bytes = self
            .storage
            .get(&path)
            .await
            .map_err(|e| CoreError::from_storage("Job", job_id, e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(path = %path, error = %e, "Corrupt status record");
            CoreError::Internal(format!("Corrupt status record for job {job_id}"))
        })
    }

    /// Status or result of `job_id`, depending on whether it is `DONE`.
    ///
    /// The executor must write the result record before it flips the status
    /// to `DONE`; the two reads here are not transactional and rely on that
    /// ordering.
    pub async fn get_result(&self, backend: &str, job_id: &str) -> Result<JobOutcome, CoreError> {
        let status = self.get_status(backend, job_id).await?;
        if status.status != JobStatus::Done {
            return Ok(JobOutcome::Pending(status));
        }

        let id = parse_for_backend(backend, job_id)?;
        let path = paths::result_path(&id);
        let bytes = self
            .storage
            .get(&path)
            .await
            .map_err(|e| CoreError::from_storage("Result", job_id, e))?;
        let result = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(path = %path, error = %e, "Corrupt result record");
            CoreError::Internal(format!("Corrupt result record for job {job_id}"))
        })?;
        Ok(JobOutcome::Finished(result))
    }

    /// Ids of `user`'s finished jobs on `backend`, oldest first.
    pub async fn list_user_jobs(&self, backend: &str, user: &str) -> Result<Vec<JobId>, CoreError> {
        validate_backend_name(backend)?;
        validate_username(user)?;

        let mut ids: Vec<JobId> = self
            .storage
            .list(&paths::finished_dir(backend, user))
            .await?
            .iter()
            .filter_map(|name| parse_entry(name))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Cheap reachability check of the storage provider.
    pub async fn check_storage(&self) -> Result<(), CoreError> {
        self.storage.list(&paths::running_dir()).await?;
        Ok(())
    }
}

fn parse_entry(name: &str) -> Option<JobId> {
    let parsed = paths::parse_job_file_name(name);
    if parsed.is_none() {
        tracing::warn!(entry = name, "Skipping entry that is not a job file");
    }
    parsed
}

fn parse_for_backend(backend: &str, raw: &str) -> Result<JobId, CoreError> {
    let id = JobId::parse(raw)?;
    if id.backend() != backend {
        return Err(CoreError::NotFound {
            entity: "Job",
            id: raw.to_string(),
        });
    }
    Ok(id)
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec(value).map_err(|e| CoreError::Internal(format!("serialization failed: {e}")))
}
