use axum::http::StatusCode;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use crate::helpers::app::make_test_app;

use super::{body_json, json_req, setup};

#[tokio::test]
async fn lecturer_creates_a_session() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let start = Utc::now() + Duration::hours(1);
    let end = start + Duration::hours(1);
    let body = serde_json::json!({
        "title": "Lecture 6",
        "start_time": start.to_rfc3339(),
        "end_time": end.to_rfc3339(),
    });

    let uri = format!("/api/units/{}/attendance/sessions", ctx.unit.id);
    let response = app
        .oneshot(json_req("POST", &uri, &ctx.lecturer, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["title"], "Lecture 6");
    assert_eq!(json["data"]["unit_id"], ctx.unit.id);
    assert_eq!(json["data"]["created_by"], ctx.lecturer.id);
    assert_eq!(json["data"]["ended"], false);
}

#[tokio::test]
async fn admin_may_create_sessions_for_any_unit() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let start = Utc::now() + Duration::hours(1);
    let body = serde_json::json!({
        "title": "Makeup lecture",
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(1)).to_rfc3339(),
    });

    let uri = format!("/api/units/{}/attendance/sessions", ctx.unit.id);
    let response = app
        .oneshot(json_req("POST", &uri, &ctx.admin, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn non_owning_lecturer_is_forbidden() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let start = Utc::now() + Duration::hours(1);
    let body = serde_json::json!({
        "title": "Hijacked",
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(1)).to_rfc3339(),
    });

    let uri = format!("/api/units/{}/attendance/sessions", ctx.unit.id);
    let response = app
        .oneshot(json_req("POST", &uri, &ctx.other_lecturer, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn inverted_time_window_is_rejected() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let start = Utc::now() + Duration::hours(2);
    let body = serde_json::json!({
        "title": "Backwards",
        "start_time": start.to_rfc3339(),
        "end_time": (start - Duration::hours(1)).to_rfc3339(),
    });

    let uri = format!("/api/units/{}/attendance/sessions", ctx.unit.id);
    let response = app
        .oneshot(json_req("POST", &uri, &ctx.lecturer, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn empty_title_is_rejected() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let start = Utc::now() + Duration::hours(1);
    let body = serde_json::json!({
        "title": "",
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(1)).to_rfc3339(),
    });

    let uri = format!("/api/units/{}/attendance/sessions", ctx.unit.id);
    let response = app
        .oneshot(json_req("POST", &uri, &ctx.lecturer, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_unit_is_not_found() {
    let (app, state) = make_test_app().await;
    let ctx = setup(state.db()).await;

    let start = Utc::now() + Duration::hours(1);
    let body = serde_json::json!({
        "title": "Nowhere",
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(1)).to_rfc3339(),
    });

    let response = app
        .oneshot(json_req(
            "POST",
            "/api/units/999999/attendance/sessions",
            &ctx.admin,
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
