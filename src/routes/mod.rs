pub mod comments;
pub mod posts;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppResult;
use crate::state::AppState;
use crate::upload::{StagedFile, PUBLIC_PREFIX};

/// The full HTTP surface, ready to serve.
pub fn app(state: AppState) -> Router {
    let staging = ServeDir::new(state.uploads.dir());
    let body_limit = state.config.uploads.max_request_bytes;

    Router::new()
        .route("/", get(index))
        .merge(users::router())
        .merge(posts::router())
        .merge(comments::router())
        .nest_service(PUBLIC_PREFIX, staging)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn index() -> &'static str {
    "Panache"
}

/// Turn a staged file into the URL an entity will reference.
///
/// With an image host configured the file is forwarded and the staged copy
/// removed. A failed forward fails the request and leaves the staged file
/// where it is.
pub(crate) async fn publish_upload(state: &AppState, file: StagedFile) -> AppResult<String> {
    let Some(host) = state.image_host.as_ref() else {
        return Ok(file.public_url());
    };

    let bytes = tokio::fs::read(&file.path).await?;
    let url = match host
        .upload(&file.stored_name, &file.content_type, bytes)
        .await
    {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(staged = %file.path.display(), "Forwarding failed, staged file kept");
            return Err(e.into());
        }
    };

    tracing::info!(file = %file.stored_name, size = file.size, "Forwarded upload");
    state.uploads.discard(&file).await;
    Ok(url)
}

/// Remove the staged copy behind `url` when the entity meant to reference it
/// was not saved. Forwarded files are already gone from staging.
pub(crate) async fn retract_upload(state: &AppState, file: &StagedFile, url: &str) {
    if url == file.public_url() {
        state.uploads.discard(file).await;
    }
}
