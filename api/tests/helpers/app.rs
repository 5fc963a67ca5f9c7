use std::convert::Infallible;

use axum::{Router, body::Body, http::Request, response::Response};
use tower::ServiceExt;
use tower::util::BoxCloneService;

use api::routes::routes;
use db::test_utils::setup_test_db;
use util::config::AppConfig;
use util::state::AppState;

pub type TestApp = BoxCloneService<Request<Body>, Response, Infallible>;

/// Builds the full router over a fresh in-memory database.
///
/// The returned [`AppState`] shares the same connection, so tests can seed
/// and inspect rows directly.
pub async fn make_test_app() -> (TestApp, AppState) {
    AppConfig::install(AppConfig::test_defaults());

    let db = setup_test_db().await;
    let app_state = AppState::new(db);

    let router = Router::new().nest("/api", routes(app_state.clone()));

    (router.into_service().boxed_clone(), app_state)
}
