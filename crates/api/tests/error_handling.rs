//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use qspool_api::error::AppError;
use qspool_core::error::CoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: every error body is an ERROR status record
// ---------------------------------------------------------------------------

#[tokio::test]
async fn error_body_has_status_record_shape() {
    let (_, json) = error_to_response(AppError::BadRequest("bad".into())).await;

    assert_eq!(json["job_id"], "None");
    assert_eq!(json["status"], "ERROR");
    assert_eq!(json["detail"], "bad");
    assert_eq!(json["error_message"], "bad");
    assert_eq!(json["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 and echoes the job id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_for_job_returns_404_with_id() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Job",
        id: "20240301_123005-fermions-alice-0a1b2".into(),
    })
    .for_job("20240301_123005-fermions-alice-0a1b2");

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["job_id"], "20240301_123005-fermions-alice-0a1b2");
    assert_eq!(
        json["error_message"],
        "Job with id 20240301_123005-fermions-alice-0a1b2 not found"
    );
}

// ---------------------------------------------------------------------------
// Test: CoreError::Invalid maps to 400 with INVALID code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_error_returns_400() {
    let err = AppError::Core(CoreError::Invalid(
        "The encoding of your json seems non utf-8!".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID");
    assert_eq!(json["error_message"], "The encoding of your json seems non utf-8!");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Conflict maps to 409 with CONFLICT code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("claim race lost".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Test: storage failures are 503 and do not leak provider details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn storage_error_returns_503_with_sanitized_message() {
    let err = AppError::Core(CoreError::Storage(
        "AccessDenied: arn:aws:s3:::secret-bucket".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "STORAGE_ERROR");
    assert_eq!(json["error_message"], "Job storage is currently unavailable");
}

// ---------------------------------------------------------------------------
// Test: auth failures map to 401 / 403
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_and_forbidden_errors() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Unauthorized("Invalid credentials!".into())))
            .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, json) =
        error_to_response(AppError::Core(CoreError::Forbidden("spooler only".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

// ---------------------------------------------------------------------------
// Test: internal core errors are 500 with a generic message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_with_generic_message() {
    let (status, json) = error_to_response(AppError::Core(CoreError::Internal(
        "Corrupt status record".into(),
    )))
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error_message"], "An internal error occurred");
    assert_eq!(json["code"], "INTERNAL_ERROR");
}
