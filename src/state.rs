use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::db::{CommentStore, PostStore, UserStore};
use crate::image_host::ImageHost;
use crate::upload::UploadGate;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: UserStore,
    pub posts: PostStore,
    pub comments: CommentStore,
    pub uploads: UploadGate,
    /// Remote host for uploaded files; `None` keeps files in staging.
    pub image_host: Option<Arc<dyn ImageHost>>,
}

impl AppState {
    /// Wire every component to the pool, each with its own log span.
    pub fn new(config: Config, db: DbPool, image_host: Option<Arc<dyn ImageHost>>) -> Self {
        let users = UserStore::new(
            db.clone(),
            tracing::info_span!("users"),
            config.auth.hash_passwords,
        );
        let posts = PostStore::new(db.clone(), tracing::info_span!("posts"));
        let comments = CommentStore::new(db, tracing::info_span!("comments"));
        let uploads = UploadGate::new(
            config.uploads_path().clone(),
            config.uploads.max_file_bytes,
            tracing::info_span!("uploads"),
        );

        Self {
            config,
            users,
            posts,
            comments,
            uploads,
            image_host,
        }
    }
}
