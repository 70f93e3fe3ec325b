//! Multipart intake: type and size checks, then staging on local disk.
//!
//! A file part moves through `received → validated → staged`. Parts that fail
//! validation are never written. What happens to a staged file afterwards
//! (forwarding, referencing) is up to the handler.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bytes::BytesMut;
use thiserror::Error;
use tracing::Span;

pub const ALLOWED_MIME_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "video/mp4",
    "video/mpeg",
    "audio/mpeg",
    "audio/wav",
];

/// URL prefix the staging directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid file type {0}. Only images, videos and audio files are allowed.")]
    UnsupportedType(String),

    #[error("File exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("Unexpected file field: {0}")]
    UnexpectedField(String),

    #[error("Only one file is accepted in field: {0}")]
    RepeatedField(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file written to the staging directory.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub field: String,
    pub stored_name: String,
    pub path: PathBuf,
    pub content_type: String,
    pub size: usize,
}

impl StagedFile {
    /// Where the static file service exposes this file.
    pub fn public_url(&self) -> String {
        format!("{}/{}", PUBLIC_PREFIX, self.stored_name)
    }
}

/// Text fields and staged files of one multipart submission.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: Vec<StagedFile>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, field: &str) -> Option<StagedFile> {
        let idx = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(idx))
    }
}

#[derive(Clone)]
pub struct UploadGate {
    dir: PathBuf,
    max_file_bytes: usize,
    span: Span,
}

pub fn is_allowed(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

fn extension_for(original_name: Option<&str>, content_type: &str) -> String {
    let from_name = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

impl UploadGate {
    pub fn new(dir: PathBuf, max_file_bytes: usize, span: Span) -> Self {
        Self {
            dir,
            max_file_bytes,
            span,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate a part and write it under a fresh UUIDv7 name.
    pub async fn stage(
        &self,
        field: &str,
        original_name: Option<&str>,
        content_type: &str,
        data: &[u8],
    ) -> Result<StagedFile, UploadError> {
        if !is_allowed(content_type) {
            return Err(UploadError::UnsupportedType(content_type.to_string()));
        }
        if data.len() > self.max_file_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_file_bytes,
            });
        }

        let stored_name = format!(
            "{}{}",
            uuid::Uuid::now_v7(),
            extension_for(original_name, content_type)
        );
        let path = self.dir.join(&stored_name);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, data).await?;

        self.span.in_scope(|| {
            tracing::info!(field, file = %stored_name, size = data.len(), "Staged upload");
        });

        Ok(StagedFile {
            field: field.to_string(),
            stored_name,
            path,
            content_type: content_type.to_string(),
            size: data.len(),
        })
    }

    /// Remove a staged file that no entity will reference.
    pub async fn discard(&self, file: &StagedFile) {
        if let Err(e) = tokio::fs::remove_file(&file.path).await {
            self.span.in_scope(|| {
                tracing::warn!(file = %file.path.display(), "Could not remove staged file: {}", e);
            });
        }
    }

    /// Read every part of a submission. At most one file is staged per name in
    /// `file_fields`; parts under `ignored_fields` are checked the same way but
    /// never written. Any other file part is rejected. Nothing is written before
    /// its part passes the type and size checks, and on failure the files staged
    /// earlier in the same submission are removed.
    pub async fn read_form(
        &self,
        mut multipart: Multipart,
        file_fields: &[&str],
        ignored_fields: &[&str],
    ) -> Result<UploadForm, UploadError> {
        let mut form = UploadForm::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    self.discard_all(&form.files).await;
                    return Err(e.into());
                }
            };

            match self
                .read_part(field, file_fields, ignored_fields, &mut form)
                .await
            {
                Ok(()) => {}
                Err(e) => {
                    self.span.in_scope(|| tracing::warn!("Rejected upload: {}", e));
                    self.discard_all(&form.files).await;
                    return Err(e);
                }
            }
        }

        Ok(form)
    }

    async fn read_part(
        &self,
        mut field: Field<'_>,
        file_fields: &[&str],
        ignored_fields: &[&str],
        form: &mut UploadForm,
    ) -> Result<(), UploadError> {
        let name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            let text = field.text().await?;
            form.fields.insert(name, text);
            return Ok(());
        };

        let ignored = ignored_fields.contains(&name.as_str());
        if !ignored && !file_fields.contains(&name.as_str()) {
            return Err(UploadError::UnexpectedField(name));
        }
        if !ignored && form.files.iter().any(|f| f.field == name) {
            return Err(UploadError::RepeatedField(name));
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !is_allowed(&content_type) {
            return Err(UploadError::UnsupportedType(content_type));
        }

        let mut data = BytesMut::new();
        let mut received = 0usize;
        while let Some(chunk) = field.chunk().await? {
            received += chunk.len();
            if received > self.max_file_bytes {
                return Err(UploadError::TooLarge {
                    limit: self.max_file_bytes,
                });
            }
            if !ignored {
                data.extend_from_slice(&chunk);
            }
        }

        if ignored {
            self.span.in_scope(|| {
                tracing::debug!(field = %name, "Skipped file part");
            });
            return Ok(());
        }

        let staged = self
            .stage(&name, Some(&original_name), &content_type, &data)
            .await?;
        form.files.push(staged);
        Ok(())
    }

    async fn discard_all(&self, files: &[StagedFile]) {
        for file in files {
            self.discard(file).await;
        }
    }
}
