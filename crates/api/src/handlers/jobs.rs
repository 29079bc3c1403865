//! Handlers for the `/api/{backend}/...` job endpoints.
//!
//! Credentials travel with every request (form fields on submit, query
//! parameters otherwise) and are checked before the backend name, so an
//! anonymous caller cannot learn which backends exist.

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use qspool_core::error::CoreError;
use qspool_core::status::{JobOutcome, StatusRecord};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::{ClaimResponse, UserJobsResponse};
use crate::state::AppState;

const BAD_JOB_REFERENCE: &str = "Error loading json data from input request!";

/// Form body of `post_job`.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    pub username: String,
    pub password: String,
    /// The job payload, a JSON document sent as text.
    pub json: String,
}

/// Query of the status and result endpoints; `json` is `{"job_id": "..."}`.
#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub username: String,
    pub password: String,
    pub json: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsQuery {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct JobReference {
    job_id: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check credentials, then that `backend` is registered.
fn check_request(state: &AppState, backend: &str, username: &str, password: &str) -> AppResult<()> {
    state.registry.authenticate(username, password)?;
    state.registry.require_backend(backend)?;
    Ok(())
}

fn parse_job_reference(raw: &str) -> AppResult<String> {
    serde_json::from_str::<JobReference>(raw)
        .map(|r| r.job_id)
        .map_err(|_| AppError::BadRequest(BAD_JOB_REFERENCE.into()))
}

fn form_rejected(rejection: FormRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected job form");
    AppError::BadRequest(rejection.body_text())
}

fn query_rejected(rejection: QueryRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected job query");
    AppError::BadRequest(rejection.body_text())
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/{backend}/post_job/
///
/// Queue the payload and answer with its `INITIALIZING` status record.
pub async fn post_job(
    State(state): State<AppState>,
    Path(backend): Path<String>,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> AppResult<Json<StatusRecord>> {
    let Form(form) = form.map_err(form_rejected)?;
    check_request(&state, &backend, &form.username, &form.password)?;

    let submitted = state
        .queue
        .submit(&backend, &form.username, form.json.as_bytes())
        .await?;
    Ok(Json(submitted.status))
}

// ---------------------------------------------------------------------------
// Status / result
// ---------------------------------------------------------------------------

/// GET /api/{backend}/get_job_status/
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(backend): Path<String>,
    query: Result<Query<JobQuery>, QueryRejection>,
) -> AppResult<Json<StatusRecord>> {
    let Query(query) = query.map_err(query_rejected)?;
    check_request(&state, &backend, &query.username, &query.password)?;
    let job_id = parse_job_reference(&query.json)?;

    let status = state
        .queue
        .get_status(&backend, &job_id)
        .await
        .map_err(|e| AppError::from(e).for_job(&job_id))?;
    Ok(Json(status))
}

/// GET /api/{backend}/get_job_result/
///
/// The result document once the job is `DONE`, its status record before.
pub async fn get_job_result(
    State(state): State<AppState>,
    Path(backend): Path<String>,
    query: Result<Query<JobQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query.map_err(query_rejected)?;
    check_request(&state, &backend, &query.username, &query.password)?;
    let job_id = parse_job_reference(&query.json)?;

    let outcome = state
        .queue
        .get_result(&backend, &job_id)
        .await
        .map_err(|e| AppError::from(e).for_job(&job_id))?;

    Ok(match outcome {
        JobOutcome::Pending(status) => Json(status).into_response(),
        JobOutcome::Finished(result) => Json(result).into_response(),
    })
}

// ---------------------------------------------------------------------------
// Spooler
// ---------------------------------------------------------------------------

/// GET /api/{backend}/get_next_job_in_queue/
///
/// Spooler only. Hands out the backend's running job if one exists,
/// otherwise moves the oldest queued job to Running.
pub async fn get_next_job_in_queue(
    State(state): State<AppState>,
    Path(backend): Path<String>,
    query: Result<Query<CredentialsQuery>, QueryRejection>,
) -> AppResult<Json<ClaimResponse>> {
    let Query(query) = query.map_err(query_rejected)?;
    check_request(&state, &backend, &query.username, &query.password)?;
    if query.username != state.config.spooler_username {
        return Err(AppError::Core(CoreError::Forbidden(
            "This is for the spooler only".into(),
        )));
    }

    let claimed = state.queue.claim_next(&backend).await?;
    Ok(Json(claimed.map_or_else(ClaimResponse::empty, ClaimResponse::from)))
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/{backend}/get_user_jobs/
///
/// Finished jobs of the caller. Storage trouble degrades to `"None"`.
pub async fn get_user_jobs(
    State(state): State<AppState>,
    Path(backend): Path<String>,
    query: Result<Query<CredentialsQuery>, QueryRejection>,
) -> AppResult<Json<UserJobsResponse>> {
    let Query(query) = query.map_err(query_rejected)?;
    check_request(&state, &backend, &query.username, &query.password)?;

    match state.queue.list_user_jobs(&backend, &query.username).await {
        Ok(ids) => Ok(Json(UserJobsResponse::from_ids(ids))),
        Err(e) => {
            tracing::warn!(
                backend = %backend,
                user = %query.username,
                error = %e,
                "Could not list finished jobs",
            );
            Ok(Json(UserJobsResponse::none()))
        }
    }
}
