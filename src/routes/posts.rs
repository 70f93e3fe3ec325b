use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::{
    MediaInput, MediaKind, NewPost, ParagraphInput, Placement, Position, Post, PostSummary, Size,
};
use crate::error::{AppError, AppResult};
use crate::extractors::{parse_id, IdParam, JsonBody};
use crate::routes::{publish_upload, retract_upload};
use crate::state::AppState;
use crate::upload::UploadForm;

const UPDATED: &str = "Post updated successfully";

// Older clients send media files along with a new post; they are checked and dropped.
const CREATE_IGNORED_FILES: [&str; 3] = ["photos", "videos", "recordings"];

#[derive(Deserialize)]
pub struct BodyUpdate {
    pub body: Vec<ParagraphInput>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/post/create", post(create_post))
        .route("/post/findall", get(find_all_posts))
        .route("/post/{id}", get(find_post))
        .route("/post/update/photos/{id}", put(update_photos))
        .route("/post/update/videos/{id}", put(update_videos))
        .route("/post/update/records/{id}", put(update_recordings))
        .route("/post/update/body/{id}", put(update_body))
        .route("/post/delete/{id}", delete(delete_post))
}

// --- Form parsing ---

fn required<'a>(form: &'a UploadForm, name: &str) -> AppResult<&'a str> {
    form.text(name)
        .ok_or_else(|| AppError::BadRequest(format!("Missing field: {}", name)))
}

/// Accepts RFC 3339 instants, bare dates (midnight UTC) and naive date-times (UTC).
pub fn parse_date(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.and_utc())
        .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", raw)))
}

fn json_field<T: DeserializeOwned>(form: &UploadForm, name: &str) -> AppResult<T> {
    serde_json::from_str(required(form, name)?)
        .map_err(|_| AppError::BadRequest(format!("Invalid {}", name)))
}

/// Rotation arrives as text and is truncated to whole degrees.
pub fn parse_rotation(raw: &str) -> AppResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .map(f64::trunc)
        .ok_or_else(|| AppError::BadRequest("Invalid rotation".to_string()))
}

/// An empty id means "create".
fn optional_id(form: &UploadForm) -> AppResult<Option<i64>> {
    match form.text("id").map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_id(raw).map(Some),
    }
}

fn media_input(form: &UploadForm) -> AppResult<MediaInput> {
    Ok(MediaInput {
        id: optional_id(form)?,
        url: required(form, "url")?.to_string(),
        placement: Placement {
            position: json_field::<Position>(form, "position")?,
            size: json_field::<Size>(form, "size")?,
            rotation: parse_rotation(required(form, "rotation")?)?,
        },
    })
}

fn new_post(form: &UploadForm) -> AppResult<NewPost> {
    let author = required(form, "authorId")?;
    Ok(NewPost {
        title: required(form, "title")?.to_string(),
        description: form.text("description").map(str::to_string),
        date: parse_date(required(form, "date")?)?,
        area: required(form, "area")?.to_string(),
        picto: form
            .text("picto")
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        visibility: form.text("visibility") == Some("true"),
        theme_color: required(form, "themeColor")?.to_string(),
        author_id: author
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid authorId".to_string()))?,
    })
}

// --- Handlers ---

/// POST /post/create: metadata only, plus an optional `picto` icon file.
async fn create_post(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Post>)> {
    let mut form = state
        .uploads
        .read_form(multipart, &["picto"], &CREATE_IGNORED_FILES)
        .await?;
    let picto_file = form.take_file("picto");

    let mut post = match new_post(&form) {
        Ok(post) => post,
        Err(e) => {
            if let Some(file) = &picto_file {
                state.uploads.discard(file).await;
            }
            return Err(e);
        }
    };

    let published = match picto_file {
        Some(file) => {
            let url = publish_upload(&state, file.clone()).await?;
            post.picto = Some(url.clone());
            Some((file, url))
        }
        None => None,
    };

    match state.posts.create_post(&post) {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => {
            if let Some((file, url)) = &published {
                retract_upload(&state, file, url).await;
            }
            Err(e.into())
        }
    }
}

async fn find_all_posts(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<Vec<PostSummary>>)> {
    let posts = state.posts.find_all_posts()?;
    Ok((StatusCode::CREATED, Json(posts)))
}

async fn find_post(
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<(StatusCode, Json<Post>)> {
    let post = state.posts.find_post_by_id(id)?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_media(
    state: &AppState,
    post_id: i64,
    kind: MediaKind,
    file_field: &str,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut form = state.uploads.read_form(multipart, &[file_field], &[]).await?;
    let file = form.take_file(file_field);

    let mut media = match media_input(&form) {
        Ok(media) => media,
        Err(e) => {
            if let Some(file) = &file {
                state.uploads.discard(file).await;
            }
            return Err(e);
        }
    };

    // A `blob:` URL is the client's local preview; the real file must come with it.
    let mut published = None;
    if media.url.starts_with("blob") {
        let Some(file) = file else {
            return Err(AppError::BadRequest(format!(
                "Still a preview and {} not received",
                kind.label()
            )));
        };
        media.url = publish_upload(state, file.clone()).await?;
        published = Some(file);
    } else if let Some(file) = file {
        state.uploads.discard(&file).await;
    }

    if let Err(e) = state.posts.attach_or_update_media(post_id, kind, &media) {
        if let Some(file) = &published {
            retract_upload(state, file, &media.url).await;
        }
        return Err(e.into());
    }
    Ok(Json(json!({ "message": UPDATED })))
}

async fn update_photos(
    State(state): State<AppState>,
    IdParam(post_id): IdParam,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    update_media(&state, post_id, MediaKind::Photo, "photo", multipart).await
}

async fn update_videos(
    State(state): State<AppState>,
    IdParam(post_id): IdParam,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    update_media(&state, post_id, MediaKind::Video, "video", multipart).await
}

async fn update_recordings(
    State(state): State<AppState>,
    IdParam(post_id): IdParam,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    update_media(&state, post_id, MediaKind::Recording, "record", multipart).await
}

async fn update_body(
    State(state): State<AppState>,
    IdParam(post_id): IdParam,
    JsonBody(update): JsonBody<BodyUpdate>,
) -> AppResult<Json<Value>> {
    state.posts.attach_or_update_body(post_id, &update.body)?;
    Ok(Json(json!({ "message": UPDATED })))
}

async fn delete_post(
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<StatusCode> {
    state.posts.delete_post_by_id(id)?;
    Ok(StatusCode::NO_CONTENT)
}
