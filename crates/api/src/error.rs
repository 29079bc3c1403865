use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use qspool_core::error::CoreError;
use qspool_core::status::{StatusRecord, NONE_TEXT};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Every error renders as a status-record body with `"status": "ERROR"`
/// (plus a machine-readable `code`), so polling clients always receive the
/// same shape whether or not the request succeeded.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `qspool_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An error about a specific job; the id is echoed in the body.
    #[error("{source}")]
    ForJob {
        job_id: String,
        #[source]
        source: Box<AppError>,
    },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Attach the job id the caller asked about.
    pub fn for_job(self, job_id: impl Into<String>) -> Self {
        AppError::ForJob {
            job_id: job_id.into(),
            source: Box::new(self),
        }
    }

    /// HTTP status, error code and client-facing message.
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Invalid(msg) => (StatusCode::BAD_REQUEST, "INVALID", msg.clone()),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Storage(msg) => {
                    tracing::error!(error = %msg, "Storage error");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORAGE_ERROR",
                        "Job storage is currently unavailable".to_string(),
                    )
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::ForJob { source, .. } => source.classify(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();
        let job_id = match &self {
            AppError::ForJob { job_id, .. } => job_id.clone(),
            _ => NONE_TEXT.to_string(),
        };

        let mut body = serde_json::to_value(StatusRecord::error(job_id, message))
            .unwrap_or_else(|_| serde_json::json!({ "status": "ERROR" }));
        body["code"] = code.into();

        (status, axum::Json(body)).into_response()
    }
}
