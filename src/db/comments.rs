use rusqlite::{params, OptionalExtension, Row};
use tracing::Span;

use super::models::{Comment, CommentInput};
use super::{write_error, StoreError, StoreResult};
use crate::state::DbPool;

const COMMENT_COLUMNS: &str =
    "id, text, videos, recordings, photos, author_id, post_id, visibility";

#[derive(Clone)]
pub struct CommentStore {
    pool: DbPool,
    span: Span,
}

// URL lists are stored as JSON arrays.
fn url_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        text: row.get(1)?,
        videos: url_list(row, 2)?,
        recordings: url_list(row, 3)?,
        photos: url_list(row, 4)?,
        author_id: row.get(5)?,
        post_id: row.get(6)?,
        visibility: row.get(7)?,
    })
}

impl CommentStore {
    pub fn new(pool: DbPool, span: Span) -> Self {
        Self { pool, span }
    }

    pub fn create_comment(&self, comment: &CommentInput) -> StoreResult<Comment> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO comments (text, videos, recordings, photos, author_id, post_id, visibility)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                comment.text,
                serde_json::to_string(&comment.videos)?,
                serde_json::to_string(&comment.recordings)?,
                serde_json::to_string(&comment.photos)?,
                comment.author_id,
                comment.post_id,
                comment.visibility,
            ],
        )
        .map_err(|e| {
            write_error(
                e,
                &format!("post {} or author {}", comment.post_id, comment.author_id),
            )
        })?;

        let id = conn.last_insert_rowid();
        tracing::info!(comment_id = id, post_id = comment.post_id, "Created comment");
        Ok(Comment {
            id,
            text: comment.text.clone(),
            videos: comment.videos.clone(),
            recordings: comment.recordings.clone(),
            photos: comment.photos.clone(),
            author_id: comment.author_id,
            post_id: comment.post_id,
            visibility: comment.visibility,
        })
    }

    /// Comments on a post, oldest first. An unknown post simply has none.
    pub fn find_comments_by_post_id(&self, post_id: i64) -> StoreResult<Vec<Comment>> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE post_id = ?1 ORDER BY id",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map(params![post_id], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// Replace every field of an existing comment.
    pub fn update_comment(&self, id: i64, comment: &CommentInput) -> StoreResult<Comment> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        let changed = conn
            .execute(
                "UPDATE comments SET text = ?1, videos = ?2, recordings = ?3, photos = ?4,
                     author_id = ?5, post_id = ?6, visibility = ?7
                 WHERE id = ?8",
                params![
                    comment.text,
                    serde_json::to_string(&comment.videos)?,
                    serde_json::to_string(&comment.recordings)?,
                    serde_json::to_string(&comment.photos)?,
                    comment.author_id,
                    comment.post_id,
                    comment.visibility,
                    id,
                ],
            )
            .map_err(|e| {
                write_error(
                    e,
                    &format!("post {} or author {}", comment.post_id, comment.author_id),
                )
            })?;
        if changed == 0 {
            return Err(StoreError::NotFound("comment"));
        }

        tracing::debug!(comment_id = id, "Updated comment");
        conn.query_row(
            &format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS),
            params![id],
            comment_from_row,
        )
        .optional()?
        .ok_or(StoreError::NotFound("comment"))
    }

    pub fn delete_comment(&self, id: i64) -> StoreResult<()> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound("comment"));
        }

        tracing::info!(comment_id = id, "Deleted comment");
        Ok(())
    }
}
