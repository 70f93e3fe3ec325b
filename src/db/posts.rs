use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::Span;

use super::canvas::{self, MediaDraft};
use super::models::{MediaInput, MediaKind, NewPost, ParagraphInput, Post, PostSummary};
use super::{delete_error, write_error, StoreError, StoreResult};
use crate::state::DbPool;

const SUMMARY_COLUMNS: &str =
    "id, title, description, date, area, picto, visibility, theme_color, author_id";

#[derive(Clone)]
pub struct PostStore {
    pool: DbPool,
    span: Span,
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<PostSummary> {
    Ok(PostSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: row.get::<_, DateTime<Utc>>(3)?,
        area: row.get(4)?,
        picto: row.get(5)?,
        visibility: row.get(6)?,
        theme_color: row.get(7)?,
        author_id: row.get(8)?,
    })
}

fn load_summary(conn: &Connection, id: i64) -> StoreResult<Option<PostSummary>> {
    let summary = conn
        .query_row(
            &format!("SELECT {} FROM posts WHERE id = ?1", SUMMARY_COLUMNS),
            params![id],
            summary_from_row,
        )
        .optional()?;
    Ok(summary)
}

impl PostStore {
    pub fn new(pool: DbPool, span: Span) -> Self {
        Self { pool, span }
    }

    /// Persist post metadata. The canvas collections start empty.
    pub fn create_post(&self, post: &NewPost) -> StoreResult<Post> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO posts (title, description, date, area, picto, visibility, theme_color, author_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                post.title,
                post.description,
                post.date,
                post.area,
                post.picto,
                post.visibility,
                post.theme_color,
                post.author_id,
            ],
        )
        .map_err(|e| write_error(e, &format!("author {}", post.author_id)))?;

        let id = conn.last_insert_rowid();
        tracing::info!(post_id = id, author_id = post.author_id, "Created post");

        let summary = load_summary(&conn, id)?.ok_or(StoreError::NotFound("post"))?;
        Ok(Post::empty(summary))
    }

    pub fn find_all_posts(&self) -> StoreResult<Vec<PostSummary>> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts ORDER BY id",
            SUMMARY_COLUMNS
        ))?;
        let posts = stmt
            .query_map([], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    pub fn find_post_by_id(&self, id: i64) -> StoreResult<Post> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        let summary = load_summary(&conn, id)?.ok_or(StoreError::NotFound("post"))?;
        Ok(Post {
            body: canvas::paragraphs_for_post(&conn, id)?,
            photos: canvas::media_for_post(&conn, MediaKind::Photo, id)?,
            videos: canvas::media_for_post(&conn, MediaKind::Video, id)?,
            recordings: canvas::media_for_post(&conn, MediaKind::Recording, id)?,
            summary,
        })
    }

    /// Delete a post and, through the schema, its canvas items.
    /// A post that still has comments is a conflict.
    pub fn delete_post_by_id(&self, id: i64) -> StoreResult<()> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        let deleted = conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])
            .map_err(|e| delete_error(e, &format!("post {} still has comments", id)))?;
        if deleted == 0 {
            return Err(StoreError::NotFound("post"));
        }

        tracing::info!(post_id = id, "Deleted post");
        Ok(())
    }

    pub fn attach_or_update_media(
        &self,
        post_id: i64,
        kind: MediaKind,
        media: &MediaInput,
    ) -> StoreResult<i64> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        let id = canvas::attach_or_update(&conn, post_id, &MediaDraft { kind, input: media })?;
        tracing::debug!(post_id, item_id = id, kind = kind.label(), "Saved media");
        Ok(id)
    }

    /// Save every paragraph before returning; one failure rolls back the batch.
    pub fn attach_or_update_body(
        &self,
        post_id: i64,
        paragraphs: &[ParagraphInput],
    ) -> StoreResult<Vec<i64>> {
        let _entered = self.span.enter();
        let mut conn = self.pool.get()?;

        let tx = conn.transaction()?;
        let ids = paragraphs
            .iter()
            .map(|paragraph| canvas::attach_or_update(&tx, post_id, paragraph))
            .collect::<StoreResult<Vec<_>>>()?;
        tx.commit()?;

        tracing::debug!(post_id, count = ids.len(), "Saved body");
        Ok(ids)
    }
}
