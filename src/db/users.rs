use rusqlite::{params, OptionalExtension};
use tracing::Span;

use super::models::{Role, User};
use super::{write_error, StoreError, StoreResult};
use crate::state::DbPool;

#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
    span: Span,
    hash_passwords: bool,
}

impl UserStore {
    /// `hash_passwords` turns on bcrypt storage and verification at login.
    /// Without it the password is stored as sent and never checked.
    pub fn new(pool: DbPool, span: Span, hash_passwords: bool) -> Self {
        Self {
            pool,
            span,
            hash_passwords,
        }
    }

    pub fn create_user(&self, pseudo: &str, password: &str, role: Role) -> StoreResult<User> {
        let _entered = self.span.enter();

        let stored = if self.hash_passwords {
            bcrypt::hash(password, bcrypt::DEFAULT_COST)?
        } else {
            password.to_string()
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (pseudo, password, role) VALUES (?1, ?2, ?3)",
            params![pseudo, stored, role],
        )
        .map_err(|e| write_error(e, &format!("pseudo '{}' is already taken", pseudo)))?;

        let id = conn.last_insert_rowid();
        tracing::info!(user_id = id, %role, "Created user");

        Ok(User {
            id,
            pseudo: pseudo.to_string(),
            password: stored,
            role,
        })
    }

    /// Look a user up by pseudo. The password only matters when hashing is on.
    pub fn find_user_by_pseudo(&self, pseudo: &str, password: &str) -> StoreResult<User> {
        let _entered = self.span.enter();
        let conn = self.pool.get()?;

        let user = conn
            .query_row(
                "SELECT id, pseudo, password, role FROM users WHERE pseudo = ?1",
                params![pseudo],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        pseudo: row.get(1)?,
                        password: row.get(2)?,
                        role: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound("user"))?;

        if self.hash_passwords && !bcrypt::verify(password, &user.password)? {
            tracing::warn!(user_id = user.id, "Password mismatch");
            return Err(StoreError::Unauthorized);
        }

        tracing::debug!(user_id = user.id, "Found user");
        Ok(user)
    }
}
