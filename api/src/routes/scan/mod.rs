use axum::{Router, routing::post};
use util::state::AppState;

pub mod post;

pub fn scan_routes() -> Router<AppState> {
    Router::new().route("/scan", post(post::submit_scan))
}
