use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;
use validator::Validate;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use db::models::user::Role;
use services::{AttendanceError, AttendanceOutcome, AttendanceService};
use util::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ScanRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    /// Opaque client-derived device identifier. Optional and advisory.
    #[validate(length(max = 128, message = "Device fingerprint too long"))]
    pub device_fingerprint: Option<String>,
}

/// POST /api/attendance/scan
///
/// A student submits a scanned QR token. The student identity comes from
/// the JWT, never from the request body.
pub async fn submit_scan(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<ScanRequest>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceOutcome>>>) {
    if claims.role != Role::Student {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Only students may submit scans")),
        );
    }

    if let Err(validation_errors) = req.validate() {
        let message = validation_errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect::<Vec<_>>()
            .join("; ");
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)));
    }

    let outcome = AttendanceService::submit(
        state.db(),
        &req.token,
        claims.sub,
        req.device_fingerprint.as_deref(),
        Utc::now(),
    )
    .await;

    match outcome {
        Ok(outcome @ AttendanceOutcome::Accepted { .. }) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(outcome), "Attendance recorded")),
        ),
        Ok(outcome @ AttendanceOutcome::AlreadyMarked { .. }) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(outcome),
                "Attendance was already recorded for this session",
            )),
        ),
        Err(e) => {
            let status = match &e {
                AttendanceError::MalformedToken
                | AttendanceError::IntegrityFailure
                | AttendanceError::ExpiredToken => StatusCode::BAD_REQUEST,
                AttendanceError::SessionNotFound => StatusCode::NOT_FOUND,
                AttendanceError::NotEnrolled => StatusCode::FORBIDDEN,
                AttendanceError::SessionClosed => StatusCode::CONFLICT,
                AttendanceError::EncodingFailure(_) | AttendanceError::Db(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };

            // Storage failures are logged with detail but reported opaquely.
            let message = match &e {
                AttendanceError::Db(db_err) => {
                    error!(error = %db_err, "Scan submission failed on storage");
                    "Internal error while recording attendance".to_string()
                }
                other => other.to_string(),
            };

            (status, Json(ApiResponse::error(message)))
        }
    }
}
