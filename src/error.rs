use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::StoreError;
use crate::image_host::ImageHostError;
use crate::upload::UploadError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Image host error: {0}")]
    ImageHost(#[from] ImageHostError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn not_found(what: &str) -> (StatusCode, String) {
    let mut chars = what.chars();
    let message = match chars.next() {
        Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
        None => "Not found".to_string(),
    };
    (StatusCode::NOT_FOUND, message)
}

fn internal(error: &dyn std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Store(e) => match e {
                StoreError::NotFound(what) => not_found(what),
                StoreError::MissingReference(what) => not_found(what),
                StoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                StoreError::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
                }
                other => internal(other),
            },
            AppError::Upload(e) => match e {
                UploadError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()),
                UploadError::Multipart(m) => (m.status(), e.to_string()),
                UploadError::Io(_) => internal(e),
                _ => (StatusCode::BAD_REQUEST, e.to_string()),
            },
            AppError::ImageHost(e) => internal(e),
            AppError::Io(e) => internal(e),
            AppError::Task(e) => internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
