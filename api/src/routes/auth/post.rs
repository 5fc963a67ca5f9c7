use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use db::models::user::{Model as UserModel, Role};
use util::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Default)]
pub struct LoginResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Option<Role>,
    pub token: String,
    pub expires_at: String,
}

/// POST /api/auth/login
///
/// Verifies credentials and returns a JWT carrying the user's role.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<ApiResponse<LoginResponse>>) {
    if let Err(validation_errors) = req.validate() {
        let message = validation_errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect::<Vec<_>>()
            .join("; ");
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(message)),
        );
    }

    let db = state.db();

    let user = match UserModel::find_by_username(db, &req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Invalid username or password")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    if !user.verify_password(&req.password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid username or password")),
        );
    }

    let (token, expires_at) = generate_jwt(user.id, user.role);

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            LoginResponse {
                id: user.id,
                username: user.username,
                email: user.email,
                role: Some(user.role),
                token,
                expires_at,
            },
            "Login successful",
        )),
    )
}
