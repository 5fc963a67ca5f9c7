use axum::http::StatusCode;
use chrono::Utc;
use tower::ServiceExt;

use db::models::{
    attendance_record::Model as AttendanceRecord, attendance_session::Model as SessionModel,
};

use crate::helpers::app::make_test_app;

use super::{body_json, get, setup};

#[tokio::test]
async fn list_includes_counts_and_pagination() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    AttendanceRecord::record_if_absent(state.db(), ctx.session.id, ctx.student.id, Utc::now(), None)
        .await
        .unwrap();

    let uri = format!("/api/units/{}/attendance/sessions", ctx.unit.id);
    let response = app.oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["page"], 1);
    let sessions = json["data"]["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["attended_count"], 1);
    assert_eq!(sessions[0]["student_count"], 1);
}

#[tokio::test]
async fn list_filters_by_title_and_lifecycle() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let (start, end) = ctx.window;
    let extra = SessionModel::create(
        state.db(),
        ctx.unit.id,
        ctx.lecturer.id,
        "Tutorial 1",
        start,
        end,
    )
    .await
    .unwrap();
    extra.end(state.db()).await.unwrap();

    let uri = format!("/api/units/{}/attendance/sessions?q=Tutorial", ctx.unit.id);
    let response = app.clone().oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["sessions"][0]["title"], "Tutorial 1");

    let uri = format!("/api/units/{}/attendance/sessions?ended=false", ctx.unit.id);
    let response = app.oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["sessions"][0]["title"], "Lecture 5");
}

#[tokio::test]
async fn current_returns_the_open_session() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let uri = format!("/api/units/{}/attendance/sessions/current", ctx.unit.id);
    let response = app.clone().oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], ctx.session.id);

    // Once ended there is nothing current.
    ctx.session.clone().end(state.db()).await.unwrap();
    let response = app.oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_session_reports_counts() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    AttendanceRecord::record_if_absent(state.db(), ctx.session.id, ctx.student.id, Utc::now(), None)
        .await
        .unwrap();

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}",
        ctx.unit.id, ctx.session.id
    );
    let response = app.oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], ctx.session.id);
    assert_eq!(json["data"]["attended_count"], 1);
    assert_eq!(json["data"]["student_count"], 1);
}

#[tokio::test]
async fn session_under_the_wrong_unit_is_not_found() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}",
        ctx.unit.id,
        ctx.session.id + 999
    );
    let response = app.oneshot(get(&uri, &ctx.admin)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn qr_is_issued_while_the_window_is_open() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/qr",
        ctx.unit.id, ctx.session.id
    );
    let response = app.clone().oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let token = json["data"]["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert!(
        json["data"]["qr_svg"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,")
    );

    // Successive calls rotate: tokens carry a fresh nonce.
    let response = app.oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    let json = body_json(response).await;
    assert_ne!(json["data"]["token"].as_str().unwrap(), token);
}

#[tokio::test]
async fn qr_is_refused_for_an_ended_session() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    ctx.session.clone().end(state.db()).await.unwrap();

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/qr",
        ctx.unit.id, ctx.session.id
    );
    let response = app.oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn qr_is_hidden_from_students() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/qr",
        ctx.unit.id, ctx.session.id
    );
    let response = app.oneshot(get(&uri, &ctx.student)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn records_are_listed_with_usernames() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    AttendanceRecord::record_if_absent(
        state.db(),
        ctx.session.id,
        ctx.student.id,
        Utc::now(),
        Some("dev-a"),
    )
    .await
    .unwrap();

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/records",
        ctx.unit.id, ctx.session.id
    );
    let response = app.oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    let record = &json["data"]["records"][0];
    assert_eq!(record["user_id"], ctx.student.id);
    assert_eq!(record["username"], "stud1");
    assert_eq!(record["status"], "present");
    assert_eq!(record["device_fingerprint"], "dev-a");
}

#[tokio::test]
async fn csv_export_carries_headers_and_rows() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    AttendanceRecord::record_if_absent(state.db(), ctx.session.id, ctx.student.id, Utc::now(), None)
        .await
        .unwrap();

    let uri = format!(
        "/api/units/{}/attendance/sessions/{}/records.csv",
        ctx.unit.id, ctx.session.id
    );
    let response = app.oneshot(get(&uri, &ctx.lecturer)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Content-Type").unwrap(),
        "text/csv"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("user_id,username,status,taken_at"));
    let row = lines.next().unwrap();
    assert!(row.starts_with(&format!("{},stud1,present,", ctx.student.id)));
}
