//! Response envelopes that are not plain status records.

use qspool_core::job_id::JobId;
use qspool_core::queue::ClaimedJob;
use qspool_core::status::NONE_TEXT;
use serde::Serialize;

/// Body of the claim endpoint.
///
/// An empty queue answers `{"job_id": "None", "job_json": "None"}`.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub job_id: String,
    pub job_json: String,
}

impl ClaimResponse {
    pub fn empty() -> Self {
        Self {
            job_id: NONE_TEXT.to_string(),
            job_json: NONE_TEXT.to_string(),
        }
    }
}

impl From<ClaimedJob> for ClaimResponse {
    fn from(job: ClaimedJob) -> Self {
        Self {
            job_id: job.job_id.to_string(),
            job_json: job.job_json,
        }
    }
}

/// Body of the finished-jobs listing: either the ids or the literal `"None"`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JobIds {
    Ids(Vec<JobId>),
    None(&'static str),
}

#[derive(Debug, Serialize)]
pub struct UserJobsResponse {
    pub job_ids: JobIds,
}

impl UserJobsResponse {
    pub fn from_ids(ids: Vec<JobId>) -> Self {
        if ids.is_empty() {
            return Self::none();
        }
        Self {
            job_ids: JobIds::Ids(ids),
        }
    }

    pub fn none() -> Self {
        Self {
            job_ids: JobIds::None(NONE_TEXT),
        }
    }
}
