use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter};

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::{attendance_record, session_device};
use util::state::AppState;

use super::common::managed_session;

/// DELETE /api/units/{unit_id}/attendance/sessions/{session_id}
///
/// Removes a session together with its records and device telemetry.
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((unit_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<Empty>>) {
    let db = state.db();

    let session = match managed_session(db, &claims, unit_id, session_id).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    let purge = async {
        attendance_record::Entity::delete_many()
            .filter(attendance_record::Column::SessionId.eq(session.id))
            .exec(db)
            .await?;
        session_device::Entity::delete_many()
            .filter(session_device::Column::SessionId.eq(session.id))
            .exec(db)
            .await?;
        session.delete(db).await
    };

    match purge.await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "Attendance session deleted")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
