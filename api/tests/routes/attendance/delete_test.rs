use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tower::ServiceExt;

use db::models::attendance_record::{
    Column as RecordCol, Entity as RecordEntity, Model as AttendanceRecord,
};
use db::models::attendance_session::Entity as SessionEntity;

use crate::helpers::app::make_test_app;

use super::{empty_req, setup};

#[tokio::test]
async fn deleting_a_session_removes_its_records() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    AttendanceRecord::record_if_absent(state.db(), ctx.session.id, ctx.student.id, Utc::now(), None)
        .await
        .unwrap();

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}",
        ctx.unit.id, ctx.session.id
    );
    let response = app
        .oneshot(empty_req("DELETE", &uri, &ctx.lecturer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session = SessionEntity::find_by_id(ctx.session.id)
        .one(state.db())
        .await
        .unwrap();
    assert!(session.is_none());

    let orphaned = RecordEntity::find()
        .filter(RecordCol::SessionId.eq(ctx.session.id))
        .count(state.db())
        .await
        .unwrap();
    assert_eq!(orphaned, 0);
}

#[tokio::test]
async fn students_may_not_delete_sessions() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}",
        ctx.unit.id, ctx.session.id
    );
    let response = app
        .oneshot(empty_req("DELETE", &uri, &ctx.student))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
