pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /{backend}/post_job/                POST  submit a job
/// /{backend}/get_job_status/          GET   status record
/// /{backend}/get_job_result/          GET   result or status record
/// /{backend}/get_next_job_in_queue/   GET   claim (spooler only)
/// /{backend}/get_user_jobs/           GET   finished job ids of the caller
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/{backend}", jobs::router())
}
