use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::Span;

use crate::config::ImageHostConfig;

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Upload response has no url")]
    MissingUrl,
}

/// Somewhere a staged file can be copied to for a permanent URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ImageHostError>;
}

/// ImageKit-style upload API: multipart POST, private key as basic auth.
pub struct ImageKitHost {
    client: reqwest::Client,
    endpoint: String,
    public_key: String,
    private_key: String,
    span: Span,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

impl ImageKitHost {
    pub fn new(endpoint: String, public_key: String, private_key: String, span: Span) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            public_key,
            private_key,
            span,
        }
    }

    /// Build a client when the config carries both keys.
    pub fn from_config(config: &ImageHostConfig, span: Span) -> Option<Self> {
        let (public_key, private_key) = config.credentials()?;
        Some(Self::new(
            config.endpoint.clone(),
            public_key.to_string(),
            private_key.to_string(),
            span,
        ))
    }
}

#[async_trait]
impl ImageHost for ImageKitHost {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ImageHostError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("fileName", file_name.to_string())
            .text("publicKey", self.public_key.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.span.in_scope(|| {
                tracing::warn!(file = file_name, status = status.as_u16(), "Image host refused upload");
            });
            return Err(ImageHostError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response.json().await?;
        let url = parsed.url.ok_or(ImageHostError::MissingUrl)?;
        self.span.in_scope(|| {
            tracing::info!(file = file_name, url = %url, "Image host accepted upload");
        });
        Ok(url)
    }
}
