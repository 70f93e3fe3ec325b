//! Items placed on a post's canvas: paragraphs, photos, videos and recordings.
//!
//! All four share the placement columns and the same write rule: an item
//! carrying an id updates that row (moving it to the given post), anything
//! else is inserted under the post. [`attach_or_update`] is that rule, once.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use super::models::{
    MediaInput, MediaItem, MediaKind, Paragraph, ParagraphInput, Placement, Position, Size,
};
use super::{write_error, StoreError, StoreResult};

const PLACEMENT_COLUMNS: [&str; 5] = ["position_x", "position_y", "width", "height", "rotation"];

/// A record that can be attached to a post's canvas.
pub trait CanvasItem {
    fn table(&self) -> &'static str;
    fn label(&self) -> &'static str;
    fn id(&self) -> Option<i64>;
    fn placement(&self) -> &Placement;
    /// Columns specific to this kind of item, in insertion order.
    fn content(&self) -> Vec<(&'static str, Value)>;
}

impl CanvasItem for ParagraphInput {
    fn table(&self) -> &'static str {
        "paragraphs"
    }

    fn label(&self) -> &'static str {
        "paragraph"
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn content(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("text", Value::Text(self.text.clone())),
            ("font", Value::Text(self.font.clone())),
        ]
    }
}

/// A media input bound to the table it belongs in.
pub struct MediaDraft<'a> {
    pub kind: MediaKind,
    pub input: &'a MediaInput,
}

impl CanvasItem for MediaDraft<'_> {
    fn table(&self) -> &'static str {
        self.kind.table()
    }

    fn label(&self) -> &'static str {
        self.kind.label()
    }

    fn id(&self) -> Option<i64> {
        self.input.id
    }

    fn placement(&self) -> &Placement {
        &self.input.placement
    }

    fn content(&self) -> Vec<(&'static str, Value)> {
        vec![("url", Value::Text(self.input.url.clone()))]
    }
}

/// Insert `item` under `post_id`, or update the row it names. Returns the row id.
///
/// An id of `0` counts as absent. Updating an id that matches no row is
/// `NotFound`; a `post_id` that matches no post is `MissingReference`.
pub fn attach_or_update<T: CanvasItem + ?Sized>(
    conn: &Connection,
    post_id: i64,
    item: &T,
) -> StoreResult<i64> {
    let placement = item.placement();
    let mut columns = vec!["post_id"];
    let mut values = vec![Value::Integer(post_id)];

    for (column, value) in item.content() {
        columns.push(column);
        values.push(value);
    }
    columns.extend(PLACEMENT_COLUMNS);
    values.extend([
        Value::Real(placement.position.x),
        Value::Real(placement.position.y),
        Value::Real(placement.size.width),
        Value::Real(placement.size.height),
        Value::Real(placement.rotation),
    ]);

    let context = format!("post {}", post_id);

    match item.id().filter(|id| *id != 0) {
        Some(id) => {
            let assignments = columns
                .iter()
                .enumerate()
                .map(|(i, column)| format!("{} = ?{}", column, i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?{}",
                item.table(),
                assignments,
                columns.len() + 1
            );
            values.push(Value::Integer(id));

            let changed = conn
                .execute(&sql, params_from_iter(values.iter()))
                .map_err(|e| write_error(e, &context))?;
            if changed == 0 {
                return Err(StoreError::NotFound(item.label()));
            }
            Ok(id)
        }
        None => {
            let placeholders = (1..=columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                item.table(),
                columns.join(", "),
                placeholders
            );

            conn.execute(&sql, params_from_iter(values.iter()))
                .map_err(|e| write_error(e, &context))?;
            Ok(conn.last_insert_rowid())
        }
    }
}

fn placement_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<Placement> {
    Ok(Placement {
        position: Position {
            x: row.get(first)?,
            y: row.get(first + 1)?,
        },
        size: Size {
            width: row.get(first + 2)?,
            height: row.get(first + 3)?,
        },
        rotation: row.get(first + 4)?,
    })
}

pub fn media_for_post(
    conn: &Connection,
    kind: MediaKind,
    post_id: i64,
) -> StoreResult<Vec<MediaItem>> {
    let sql = format!(
        "SELECT id, post_id, url, {} FROM {} WHERE post_id = ?1 ORDER BY id",
        PLACEMENT_COLUMNS.join(", "),
        kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;

    let items = stmt
        .query_map(params![post_id], |row| {
            Ok(MediaItem {
                id: row.get(0)?,
                post_id: row.get(1)?,
                url: row.get(2)?,
                placement: placement_from_row(row, 3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn paragraphs_for_post(conn: &Connection, post_id: i64) -> StoreResult<Vec<Paragraph>> {
    let sql = format!(
        "SELECT id, post_id, text, font, {} FROM paragraphs WHERE post_id = ?1 ORDER BY id",
        PLACEMENT_COLUMNS.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;

    let paragraphs = stmt
        .query_map(params![post_id], |row| {
            Ok(Paragraph {
                id: row.get(0)?,
                post_id: row.get(1)?,
                text: row.get(2)?,
                font: row.get(3)?,
                placement: placement_from_row(row, 4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(paragraphs)
}
