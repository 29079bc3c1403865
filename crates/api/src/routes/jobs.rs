//! Route definitions for the per-backend job endpoints.
//!
//! The trailing slashes are part of the public URLs.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/api/{backend}`.
///
/// ```text
/// POST   /post_job/               -> post_job
/// GET    /get_job_status/         -> get_job_status
/// GET    /get_job_result/         -> get_job_result
/// GET    /get_next_job_in_queue/  -> get_next_job_in_queue
/// GET    /get_user_jobs/          -> get_user_jobs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/post_job/", post(jobs::post_job))
        .route("/get_job_status/", get(jobs::get_job_status))
        .route("/get_job_result/", get(jobs::get_job_result))
        .route("/get_next_job_in_queue/", get(jobs::get_next_job_in_queue))
        .route("/get_user_jobs/", get(jobs::get_user_jobs))
}
