//! Bookkeeping helpers for the spooler side of the protocol.
//!
//! Running a job is not the queue's business, but the writes around it have
//! a required order: a result record must exist before the status says
//! `DONE`, and the payload leaves Running only after the status is final.
//! [`ExecutorLedger`] performs those writes in that order.

use std::sync::Arc;

use crate::error::CoreError;
use crate::job_id::JobId;
use crate::paths;
use crate::queue::{encode, ClaimedJob};
use crate::status::{JobStatus, StatusRecord};
use crate::storage::{StorageBackend, StorageError};

#[derive(Clone)]
pub struct ExecutorLedger {
    storage: Arc<dyn StorageBackend>,
}

impl ExecutorLedger {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Read the payload of a claimed job from the Running location.
    pub async fn load_payload(&self, claimed: &ClaimedJob) -> Result<serde_json::Value, CoreError> {
        let bytes = self
            .storage
            .get(&claimed.job_json)
            .await
            .map_err(|e| CoreError::from_storage("Running job", claimed.job_id.to_string(), e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Invalid(format!("Job {} payload is not JSON: {e}", claimed.job_id)))
    }

    /// Record that execution of `job_id` has started.
    pub async fn mark_running(&self, job_id: &JobId, detail: &str) -> Result<(), CoreError> {
        let record = StatusRecord::with_status(job_id.to_string(), JobStatus::Running, detail);
        self.write_status(job_id, &record).await?;
        tracing::info!(job_id = %job_id, "Job running");
        Ok(())
    }

    /// Finish `job_id` successfully: result, then `DONE`, then Running -> Finished.
    ///
    /// A job that is not in Running is `NotFound` and nothing is written.
    pub async fn complete(
        &self,
        job_id: &JobId,
        result: &serde_json::Value,
        detail: &str,
    ) -> Result<(), CoreError> {
        self.require_running(job_id).await?;
        self.storage
            .put(&paths::result_path(job_id), encode(result)?)
            .await
            .map_err(|e| CoreError::from_storage("Result", job_id.to_string(), e))?;

        let record = StatusRecord::with_status(job_id.to_string(), JobStatus::Done, detail);
        self.write_status(job_id, &record).await?;
        self.retire(job_id).await?;

        tracing::info!(job_id = %job_id, "Job done");
        Ok(())
    }

    /// Finish `job_id` with an error: `ERROR` status, then Running -> Finished.
    pub async fn fail(&self, job_id: &JobId, message: &str) -> Result<(), CoreError> {
        self.require_running(job_id).await?;
        let record = StatusRecord::error(job_id.to_string(), message);
        self.write_status(job_id, &record).await?;
        self.retire(job_id).await?;

        tracing::warn!(job_id = %job_id, error = message, "Job failed");
        Ok(())
    }

    /// Remove the status, result and finished payload of a job.
    ///
    /// Records that are already gone are skipped. Queued or running
    /// payloads are left alone.
    pub async fn delete_job(&self, job_id: &JobId) -> Result<(), CoreError> {
        for path in [
            paths::status_path(job_id),
            paths::result_path(job_id),
            paths::finished_path(job_id),
        ] {
            match self.storage.delete(&path).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(job_id = %job_id, "Job records deleted");
        Ok(())
    }

    async fn write_status(&self, job_id: &JobId, record: &StatusRecord) -> Result<(), CoreError> {
        self.storage
            .put(&paths::status_path(job_id), encode(record)?)
            .await
            .map_err(|e| CoreError::from_storage("Status", job_id.to_string(), e))?;
        tracing::debug!(job_id = %job_id, status = record.status.as_str(), "Status written");
        Ok(())
    }

    async fn require_running(&self, job_id: &JobId) -> Result<(), CoreError> {
        self.storage
            .get(&paths::running_path(job_id))
            .await
            .map(|_| ())
            .map_err(|e| CoreError::from_storage("Running job", job_id.to_string(), e))
    }

    async fn retire(&self, job_id: &JobId) -> Result<(), CoreError> {
        self.storage
            .move_object(&paths::running_path(job_id), &paths::finished_path(job_id))
            .await
            .map_err(|e| CoreError::from_storage("Running job", job_id.to_string(), e))
    }
}
