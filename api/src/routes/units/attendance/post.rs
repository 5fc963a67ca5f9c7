use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum::extract::Extension;
use sea_orm::DbErr;
use validator::Validate;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use db::models::attendance_session::Model as AttendanceSession;
use util::state::AppState;

use super::common::{AttendanceSessionResponse, CreateSessionReq, manageable_unit};

/// POST /api/units/{unit_id}/attendance/sessions
///
/// Creates a new attendance session for the unit. Only the unit's lecturer
/// (or an admin) may create sessions, and the time window must be valid.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(unit_id): Path<i64>,
    Json(req): Json<CreateSessionReq>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceSessionResponse>>>) {
    if let Err(validation_errors) = req.validate() {
        let message = validation_errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect::<Vec<_>>()
            .join("; ");
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiResponse::error(message)));
    }

    let db = state.db();

    let unit = match manageable_unit(db, &claims, unit_id).await {
        Ok(unit) => unit,
        Err(resp) => return resp,
    };

    match AttendanceSession::create(
        db,
        unit.id,
        claims.sub,
        &req.title,
        req.start_time,
        req.end_time,
    )
    .await
    {
        Ok(session) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                Some(AttendanceSessionResponse::from(session)),
                "Attendance session created",
            )),
        ),
        Err(DbErr::Custom(msg)) => (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiResponse::error(msg))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
