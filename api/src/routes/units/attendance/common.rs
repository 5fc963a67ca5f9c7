use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::claims::Claims;
use crate::response::ApiResponse;
use db::models::attendance_session::{
    Entity as SessionEntity, Model as AttendanceSession,
};
use db::models::unit::{Entity as UnitEntity, Model as Unit};

#[derive(Debug, Serialize)]
pub struct AttendanceSessionResponse {
    pub id: i64,
    pub unit_id: i64,
    pub created_by: i64,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub ended: bool,
    pub created_at: String,
    pub updated_at: String,
    pub attended_count: i64, // students who marked for this session
    pub student_count: i64,  // total students enrolled in the unit
}

impl From<db::models::attendance_session::Model> for AttendanceSessionResponse {
    fn from(m: db::models::attendance_session::Model) -> Self {
        Self {
            id: m.id,
            unit_id: m.unit_id,
            created_by: m.created_by,
            title: m.title,
            start_time: m.start_time.to_rfc3339(),
            end_time: m.end_time.to_rfc3339(),
            ended: m.ended,
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
            attended_count: 0,
            student_count: 0,
        }
    }
}

impl AttendanceSessionResponse {
    pub fn from_with_counts(
        m: db::models::attendance_session::Model,
        attended_count: i64,
        student_count: i64,
    ) -> Self {
        let mut base = Self::from(m);
        base.attended_count = attended_count;
        base.student_count = student_count;
        base
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
    pub q: Option<String>,    // search in title
    pub ended: Option<bool>,  // filter by lifecycle state
    pub sort: Option<String>, // "start_time", "-start_time", "title", "-title"
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub sessions: Vec<AttendanceSessionResponse>,
    pub page: i32,
    pub per_page: i32,
    pub total: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionReq {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Loads the unit and checks the caller may manage its sessions
/// (owning lecturer or an admin role).
pub async fn manageable_unit<T: Serialize + Default>(
    db: &DatabaseConnection,
    claims: &Claims,
    unit_id: i64,
) -> Result<Unit, (StatusCode, Json<ApiResponse<T>>)> {
    let unit = match UnitEntity::find_by_id(unit_id).one(db).await {
        Ok(Some(unit)) => unit,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Unit not found")),
            ));
        }
        Err(_) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Database error retrieving unit")),
            ));
        }
    };

    if unit.lecturer_id != claims.sub && !claims.role.is_admin() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "Only the unit's lecturer may manage its attendance sessions",
            )),
        ));
    }

    Ok(unit)
}

/// [`manageable_unit`] plus a session lookup scoped to that unit. A session
/// id that exists under another unit is reported as not found.
pub async fn managed_session<T: Serialize + Default>(
    db: &DatabaseConnection,
    claims: &Claims,
    unit_id: i64,
    session_id: i64,
) -> Result<AttendanceSession, (StatusCode, Json<ApiResponse<T>>)> {
    manageable_unit::<T>(db, claims, unit_id).await?;

    match SessionEntity::find_by_id(session_id).one(db).await {
        Ok(Some(session)) if session.unit_id == unit_id => Ok(session),
        Ok(_) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Attendance session not found")),
        )),
        Err(_) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Database error retrieving session")),
        )),
    }
}
