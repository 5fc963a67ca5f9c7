use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::{
    attendance_record::Model as AttendanceRecord,
    attendance_session::{Column as SessionCol, Entity as SessionEntity, Model as AttendanceSession},
    enrollment::Model as Enrollment,
    user::Entity as UserEntity,
};
use services::{AttendanceService, IssuedToken};
use util::state::AppState;

use super::common::{
    AttendanceSessionResponse, ListQuery, ListResponse, manageable_unit, managed_session,
};

const MAX_PER_PAGE: i32 = 100;
const DEFAULT_PER_PAGE: i32 = 20;

/// GET /api/units/{unit_id}/attendance/sessions
///
/// Paginated session listing with optional title search, lifecycle filter
/// and sorting. Each entry carries its attendance count alongside the
/// unit's enrollment total.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(unit_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> (StatusCode, Json<ApiResponse<Option<ListResponse>>>) {
    let db = state.db();

    let unit = match manageable_unit(db, &claims, unit_id).await {
        Ok(unit) => unit,
        Err(resp) => return resp,
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let mut find = SessionEntity::find().filter(SessionCol::UnitId.eq(unit.id));

    if let Some(ref q) = query.q {
        find = find.filter(SessionCol::Title.contains(q));
    }
    if let Some(ended) = query.ended {
        find = find.filter(SessionCol::Ended.eq(ended));
    }

    find = match query.sort.as_deref() {
        Some("title") => find.order_by_asc(SessionCol::Title),
        Some("-title") => find.order_by_desc(SessionCol::Title),
        Some("start_time") => find.order_by_asc(SessionCol::StartTime),
        _ => find.order_by_desc(SessionCol::StartTime),
    };

    let paginator = find.paginate(db, per_page as u64);

    let total = match paginator.num_items().await {
        Ok(n) => n as i32,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let sessions = match paginator.fetch_page((page - 1) as u64).await {
        Ok(rows) => rows,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let counts = match AttendanceSession::attended_counts_for(db, &ids).await {
        Ok(counts) => counts,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };
    let student_count = match Enrollment::student_count_for_unit(db, unit.id).await {
        Ok(n) => n,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let sessions = sessions
        .into_iter()
        .map(|s| {
            let attended = counts.get(&s.id).copied().unwrap_or(0);
            AttendanceSessionResponse::from_with_counts(s, attended, student_count)
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            Some(ListResponse {
                sessions,
                page,
                per_page,
                total,
            }),
            "Attendance sessions retrieved",
        )),
    )
}

/// GET /api/units/{unit_id}/attendance/sessions/current
///
/// The session currently open for scanning, if any. Used by the projector
/// view to decide which session to display.
pub async fn get_current_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(unit_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceSessionResponse>>>) {
    let db = state.db();

    let unit = match manageable_unit(db, &claims, unit_id).await {
        Ok(unit) => unit,
        Err(resp) => return resp,
    };

    match AttendanceSession::find_current(db, unit.id, Utc::now()).await {
        Ok(Some(session)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(AttendanceSessionResponse::from(session)),
                "Current attendance session retrieved",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No session is open for scanning")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// GET /api/units/{unit_id}/attendance/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((unit_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceSessionResponse>>>) {
    let db = state.db();

    let session = match managed_session(db, &claims, unit_id, session_id).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    let attended = match AttendanceSession::attended_count(db, session.id).await {
        Ok(n) => n,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };
    let enrolled = match Enrollment::student_count_for_unit(db, session.unit_id).await {
        Ok(n) => n,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            Some(AttendanceSessionResponse::from_with_counts(
                session, attended, enrolled,
            )),
            "Attendance session retrieved",
        )),
    )
}

/// GET /api/units/{unit_id}/attendance/sessions/{session_id}/qr
///
/// The current rotating QR material for the session. A session outside its
/// scan window (or already ended) cannot hand out codes.
pub async fn get_session_qr(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((unit_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<Option<IssuedToken>>>) {
    let db = state.db();

    let session = match managed_session(db, &claims, unit_id, session_id).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    match AttendanceService::issue_qr(&session, Utc::now()) {
        Ok(issued) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(issued), "QR code issued")),
        ),
        Err(services::AttendanceError::SessionClosed) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "Session is not open for scanning",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to issue QR code: {e}"))),
        ),
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceRecordResponse {
    pub session_id: i64,
    pub user_id: i64,
    pub username: String,
    pub status: String,
    pub taken_at: String,
    pub device_fingerprint: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct RecordListResponse {
    pub records: Vec<AttendanceRecordResponse>,
    pub page: i32,
    pub per_page: i32,
    pub total: i32,
}

#[derive(Debug, serde::Deserialize)]
pub struct RecordListQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
}

async fn with_usernames(
    db: &sea_orm::DatabaseConnection,
    records: Vec<db::models::attendance_record::Model>,
) -> Result<Vec<AttendanceRecordResponse>, sea_orm::DbErr> {
    let user_ids: Vec<i64> = records.iter().map(|r| r.user_id).collect();
    let users: std::collections::HashMap<i64, String> = UserEntity::find()
        .filter(db::models::user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    Ok(records
        .into_iter()
        .map(|r| AttendanceRecordResponse {
            session_id: r.session_id,
            user_id: r.user_id,
            username: users.get(&r.user_id).cloned().unwrap_or_default(),
            status: r.status.to_string(),
            taken_at: r.taken_at.to_rfc3339(),
            device_fingerprint: r.device_fingerprint,
        })
        .collect())
}

/// GET /api/units/{unit_id}/attendance/sessions/{session_id}/records
pub async fn list_session_records(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((unit_id, session_id)): Path<(i64, i64)>,
    Query(query): Query<RecordListQuery>,
) -> (StatusCode, Json<ApiResponse<Option<RecordListResponse>>>) {
    let db = state.db();

    let session = match managed_session(db, &claims, unit_id, session_id).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let paginator = db::models::attendance_record::Entity::find()
        .filter(db::models::attendance_record::Column::SessionId.eq(session.id))
        .paginate(db, per_page as u64);

    let listing = async {
        let total = paginator.num_items().await? as i32;
        let rows = paginator.fetch_page((page - 1) as u64).await?;
        let records = with_usernames(db, rows).await?;
        Ok::<_, sea_orm::DbErr>((total, records))
    };

    match listing.await {
        Ok((total, records)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Some(RecordListResponse {
                    records,
                    page,
                    per_page,
                    total,
                }),
                "Attendance records retrieved",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

fn esc(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// GET /api/units/{unit_id}/attendance/sessions/{session_id}/records.csv
///
/// CSV export of a session's records for offline mark processing.
pub async fn export_session_records_csv(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((unit_id, session_id)): Path<(i64, i64)>,
) -> Response {
    let db = state.db();

    let session = match managed_session::<Empty>(db, &claims, unit_id, session_id).await {
        Ok(session) => session,
        Err(resp) => return resp.into_response(),
    };

    let export = async {
        let rows = AttendanceRecord::find_for_session(db, session.id).await?;
        with_usernames(db, rows).await
    };
    let records = match export.await {
        Ok(records) => records,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
            )
                .into_response();
        }
    };

    let mut csv = String::from("user_id,username,status,taken_at\n");
    for r in &records {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            r.user_id,
            esc(&r.username),
            esc(&r.status),
            esc(&r.taken_at),
        ));
    }

    let filename = format!("attachment; filename=\"session_{}_records.csv\"", session.id);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    )
        .into_response()
}
