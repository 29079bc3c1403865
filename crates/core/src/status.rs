//! Status and result records kept next to each job.
//!
//! The serialized forms match the JSON the executor and existing clients
//! already exchange: `{"job_id", "status", "detail", "error_message"}` with
//! upper-case status names and the literal string `"None"` for absent text.

use serde::{Deserialize, Serialize};

/// Placeholder written for text fields that carry no value.
pub const NONE_TEXT: &str = "None";

/// Detail text of the status written at submission.
pub const SUBMITTED_DETAIL: &str = "Got your json.";

/// Job lifecycle status.
///
/// Only `Initializing` is written by the queue; every later value comes
/// from the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Initializing,
    Queued,
    Running,
    Done,
    Error,
}

impl JobStatus {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        }
    }
}

fn none_text() -> String {
    NONE_TEXT.to_string()
}

/// Per-job status document.
///
/// `job_id` is kept as plain text: error replies echo whatever id the
/// caller sent, well-formed or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default = "none_text")]
    pub detail: String,
    #[serde(default = "none_text")]
    pub error_message: String,
}

impl StatusRecord {
    /// The record written when a job is accepted.
    pub fn submitted(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Initializing,
            detail: SUBMITTED_DETAIL.to_string(),
            error_message: none_text(),
        }
    }

    pub fn with_status(job_id: impl Into<String>, status: JobStatus, detail: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            detail: detail.into(),
            error_message: none_text(),
        }
    }

    /// An `ERROR` record whose detail and error message are both `message`.
    pub fn error(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            job_id: job_id.into(),
            status: JobStatus::Error,
            detail: message.clone(),
            error_message: message,
        }
    }
}

/// Answer of a result query: either the job is still in flight (or failed)
/// and the caller gets its status, or it is done and the caller gets the
/// executor's result document.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Pending(StatusRecord),
    Finished(serde_json::Value),
}
