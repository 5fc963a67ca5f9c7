use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use sea_orm::EntityTrait;
use serde::Deserialize;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use db::models::attendance_record::{
    Entity as RecordEntity, Model as AttendanceRecord, Status,
};
use util::state::AppState;

use super::common::{AttendanceSessionResponse, managed_session};

/// PUT /api/units/{unit_id}/attendance/sessions/{session_id}/end
///
/// Ends the session. Ending is idempotent but reported: a second call gets
/// a 409 so the client knows nothing changed.
pub async fn end_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((unit_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceSessionResponse>>>) {
    let db = state.db();

    let session = match managed_session(db, &claims, unit_id, session_id).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    if session.ended {
        return (
            StatusCode::CONFLICT,
            Json(ApiResponse::error("Session has already ended")),
        );
    }

    match session.end(db).await {
        Ok(session) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(AttendanceSessionResponse::from(session)),
                "Attendance session ended",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetStatusReq {
    pub status: Status,
}

/// PUT /api/units/{unit_id}/attendance/sessions/{session_id}/records/{student_id}
///
/// Lecturer override of a recorded status (e.g. marking a scan late). Only
/// existing records can be toggled; this path never creates one.
pub async fn set_record_status(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((unit_id, session_id, student_id)): Path<(i64, i64, i64)>,
    Json(req): Json<SetStatusReq>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceRecord>>>) {
    let db = state.db();

    let session = match managed_session(db, &claims, unit_id, session_id).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    let record = match RecordEntity::find_by_id((session.id, student_id)).one(db).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Attendance record not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    match record.set_status(db, req.status).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(record),
                "Attendance record updated",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
