use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use crate::db::models::{Comment, CommentInput};
use crate::error::AppResult;
use crate::extractors::{IdParam, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comment/create", post(create_comment))
        .route("/comments/post/{post_id}", get(list_comments))
        .route("/comment/update/{id}", put(update_comment))
        .route("/comment/delete/{id}", delete(delete_comment))
}

async fn create_comment(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CommentInput>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = state.comments.create_comment(&input)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments(
    State(state): State<AppState>,
    IdParam(post_id): IdParam,
) -> AppResult<(StatusCode, Json<Vec<Comment>>)> {
    let comments = state.comments.find_comments_by_post_id(post_id)?;
    Ok((StatusCode::CREATED, Json(comments)))
}

async fn update_comment(
    State(state): State<AppState>,
    IdParam(id): IdParam,
    JsonBody(input): JsonBody<CommentInput>,
) -> AppResult<Json<Comment>> {
    let comment = state.comments.update_comment(id, &input)?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<StatusCode> {
    state.comments.delete_comment(id)?;
    Ok(StatusCode::NO_CONTENT)
}
