use axum::{
    Router,
    routing::{delete, get, post, put},
};
use util::state::AppState;

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(post::create_session))
        .route("/sessions", get(get::list_sessions))
        .route("/sessions/current", get(get::get_current_session))
        .route("/sessions/{session_id}", get(get::get_session))
        .route("/sessions/{session_id}", delete(delete::delete_session))
        .route("/sessions/{session_id}/qr", get(get::get_session_qr))
        .route("/sessions/{session_id}/end", put(put::end_session))
        .route(
            "/sessions/{session_id}/records",
            get(get::list_session_records),
        )
        .route(
            "/sessions/{session_id}/records.csv",
            get(get::export_session_records_csv),
        )
        .route(
            "/sessions/{session_id}/records/{student_id}",
            put(put::set_record_status),
        )
}
