//! Remote background-removal service
//!
//! The service takes one image as multipart field `file` and answers with
//! the processed PNG. Any non-success status is a failure; its body is not
//! interpreted.

use reqwest::multipart::{Form, Part};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("server responded with status {status}")]
    Status { status: u16 },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned an empty image")]
    EmptyBody,
}

/// One image sent for removal
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

/// Asynchronous `removeBackground(imageBytes) -> imageBytes | failure`
pub trait BackgroundRemover {
    fn remove_background(
        &self,
        upload: Upload,
    ) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send;
}

/// HTTP client for the removal endpoint
#[derive(Debug, Clone)]
pub struct HttpRemover {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemover {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl BackgroundRemover for HttpRemover {
    async fn remove_background(&self, upload: Upload) -> Result<Vec<u8>, RemoteError> {
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)?;
        let form = Form::new().part("file", part);

        debug!("POST {} ({})", self.endpoint, upload.file_name);
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(RemoteError::EmptyBody);
        }
        Ok(body.to_vec())
    }
}
