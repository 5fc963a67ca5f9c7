use axum::http::StatusCode;
use chrono::Utc;
use tower::ServiceExt;

use db::models::attendance_record::Model as AttendanceRecord;

use crate::helpers::app::make_test_app;

use super::{body_json, empty_req, json_req, setup};

#[tokio::test]
async fn ending_a_session_stops_scanning() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/end",
        ctx.unit.id, ctx.session.id
    );
    let response = app
        .clone()
        .oneshot(empty_req("PUT", &uri, &ctx.lecturer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["ended"], true);

    // Ending twice is reported as a conflict.
    let response = app
        .oneshot(empty_req("PUT", &uri, &ctx.lecturer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn only_the_owner_or_admin_may_end() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/end",
        ctx.unit.id, ctx.session.id
    );
    let response = app
        .clone()
        .oneshot(empty_req("PUT", &uri, &ctx.other_lecturer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(empty_req("PUT", &uri, &ctx.admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn lecturer_can_toggle_a_record_status() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    AttendanceRecord::record_if_absent(state.db(), ctx.session.id, ctx.student.id, Utc::now(), None)
        .await
        .unwrap();

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/records/{}",
        ctx.unit.id, ctx.session.id, ctx.student.id
    );
    let response = app
        .oneshot(json_req(
            "PUT",
            &uri,
            &ctx.lecturer,
            serde_json::json!({ "status": "late" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "late");
}

#[tokio::test]
async fn toggling_a_missing_record_is_not_found() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/records/{}",
        ctx.unit.id, ctx.session.id, ctx.student.id
    );
    let response = app
        .oneshot(json_req(
            "PUT",
            &uri,
            &ctx.lecturer,
            serde_json::json!({ "status": "absent" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
