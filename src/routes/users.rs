use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::{Role, User};
use crate::error::{AppError, AppResult};
use crate::extractors::JsonBody;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub pseudo: String,
    pub password: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub pseudo: String,
    #[serde(default)]
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(create_user))
        .route("/user/login", post(login))
}

async fn create_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let pseudo = req.pseudo.trim().to_string();
    if pseudo.is_empty() {
        return Err(AppError::BadRequest("Pseudo cannot be empty".into()));
    }

    // Hashing may be on; keep bcrypt off the async workers.
    let users = state.users.clone();
    let user = tokio::task::spawn_blocking(move || {
        users.create_user(&pseudo, &req.password, req.role)
    })
    .await??;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /user/login: a lookup by pseudo. The password is only checked when
/// `auth.hash_passwords` is enabled.
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let users = state.users.clone();
    let user = tokio::task::spawn_blocking(move || {
        users.find_user_by_pseudo(&req.pseudo, &req.password)
    })
    .await??;
    Ok((StatusCode::CREATED, Json(user)))
}
