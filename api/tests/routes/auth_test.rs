use axum::{
    body::Body as AxumBody,
    http::{Request, StatusCode},
};
use serde_json::Value;
use serial_test::serial;
use tower::ServiceExt;

use db::models::user::{Model as UserModel, Role};

use crate::helpers::app::make_test_app;

fn login_request(username: &str, password: &str) -> Request<AxumBody> {
    let body = serde_json::json!({ "username": username, "password": password });
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("Content-Type", "application/json")
        .body(AxumBody::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
#[serial]
async fn login_with_valid_credentials_returns_token() {
    let (app, state) = make_test_app().await;

    let user = UserModel::create(state.db(), "alice", "alice@uni.test", "secretpw", Role::Student)
        .await
        .unwrap();

    let response = app.oneshot(login_request("alice", "secretpw")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["id"], user.id);
    assert_eq!(json["data"]["username"], "alice");
    assert_eq!(json["data"]["role"], "student");
    assert!(json["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
#[serial]
async fn login_with_wrong_password_is_unauthorized() {
    let (app, state) = make_test_app().await;

    UserModel::create(state.db(), "alice", "alice@uni.test", "secretpw", Role::Student)
        .await
        .unwrap();

    let response = app.oneshot(login_request("alice", "wrong")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn login_with_unknown_user_is_unauthorized() {
    let (app, _state) = make_test_app().await;

    let response = app.oneshot(login_request("ghost", "whatever")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_requires_token() {
    let (app, _state) = make_test_app().await;

    let req = Request::builder()
        .method("GET")
        .uri("/api/units/1/attendance/sessions")
        .body(AxumBody::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
