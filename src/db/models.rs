use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Actor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Actor => "ACTOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "ACTOR" => Ok(Role::Actor),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub pseudo: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Where an item sits on a post's canvas. Values are stored as given.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub position: Position,
    pub size: Size,
    pub rotation: f64,
}

/// Post metadata, as listed by `find_all_posts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub area: String,
    pub picto: Option<String>,
    pub visibility: bool,
    pub theme_color: String,
    pub author_id: i64,
}

/// A post with its canvas contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub body: Vec<Paragraph>,
    pub photos: Vec<MediaItem>,
    pub videos: Vec<MediaItem>,
    pub recordings: Vec<MediaItem>,
}

impl Post {
    pub fn empty(summary: PostSummary) -> Self {
        Self {
            summary,
            body: Vec::new(),
            photos: Vec::new(),
            videos: Vec::new(),
            recordings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub area: String,
    pub picto: Option<String>,
    pub visibility: bool,
    pub theme_color: String,
    pub author_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub font: String,
    #[serde(flatten)]
    pub placement: Placement,
}

/// Incoming paragraph. Without an `id` it is created, otherwise updated.
#[derive(Debug, Clone, Deserialize)]
pub struct ParagraphInput {
    #[serde(default)]
    pub id: Option<i64>,
    pub text: String,
    pub font: String,
    #[serde(flatten)]
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Recording,
}

impl MediaKind {
    pub fn table(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photos",
            MediaKind::Video => "videos",
            MediaKind::Recording => "recordings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Recording => "recording",
        }
    }
}

/// A photo, video or recording placed on a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: i64,
    pub post_id: i64,
    pub url: String,
    #[serde(flatten)]
    pub placement: Placement,
}

#[derive(Debug, Clone)]
pub struct MediaInput {
    pub id: Option<i64>,
    pub url: String,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub videos: Vec<String>,
    pub recordings: Vec<String>,
    pub photos: Vec<String>,
    pub author_id: i64,
    pub post_id: i64,
    pub visibility: bool,
}

/// Comment fields as sent on create and on (full) update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    pub text: String,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub recordings: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub author_id: i64,
    pub post_id: i64,
    #[serde(default)]
    pub visibility: bool,
}
