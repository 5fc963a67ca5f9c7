use axum::Router;
use util::state::AppState;

pub mod attendance;

pub fn units_routes() -> Router<AppState> {
    Router::new().nest("/{unit_id}/attendance", attendance::attendance_routes())
}
