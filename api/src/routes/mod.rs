//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Authentication endpoints (login, public)
//! - `/units/{unit_id}/attendance` → Attendance session management
//!   (lecturers and admins; per-unit ownership enforced per handler)
//! - `/attendance` → Student scan submission (authenticated)

use crate::auth::guards::{allow_authenticated, allow_lecturer};
use crate::routes::{
    auth::auth_routes, health::health_routes, scan::scan_routes, units::units_routes,
};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod auth;
pub mod health;
pub mod scan;
pub mod units;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest(
            "/units",
            units_routes().route_layer(from_fn(allow_lecturer)),
        )
        .nest(
            "/attendance",
            scan_routes().route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
