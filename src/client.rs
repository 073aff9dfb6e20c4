//! HTTP client for a running retouch server.
//!
//! Mirrors the endpoints one-to-one. Non-2xx responses are turned into
//! [`ClientError::Api`] carrying the server's `{error}` message.

use crate::types::{
    ErrorBody, RenameRequest, RenameResponse, ReprocessRequest, ReprocessResponse, UploadResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(e) => e.status(),
            ClientError::Api { status, .. } => Some(*status),
        }
    }
}

/// One file to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` like `http://127.0.0.1:3000` (a trailing slash is fine).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Absolute URL for a server path such as `/results/a.png?t=1`.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<UploadResponse, ClientError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.filename)
                .mime_str(&file.mime)?;
            form = form.part("files", part);
        }
        let response = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        json_or_error(response).await
    }

    pub async fn reprocess(
        &self,
        target_filename: &str,
        overlay: &str,
    ) -> Result<ReprocessResponse, ClientError> {
        let request = ReprocessRequest {
            target_filename: Some(target_filename.to_string()),
            overlay: Some(overlay.to_string()),
        };
        let response = self
            .http
            .post(self.url("/reprocess"))
            .json(&request)
            .send()
            .await?;
        json_or_error(response).await
    }

    pub async fn rename(&self, old: &str, new: &str) -> Result<RenameResponse, ClientError> {
        let request = RenameRequest {
            old_filename: Some(old.to_string()),
            new_filename: Some(new.to_string()),
        };
        let response = self
            .http
            .post(self.url("/rename"))
            .json(&request)
            .send()
            .await?;
        json_or_error(response).await
    }

    /// The zip of all results.
    pub async fn download_all(&self) -> Result<Vec<u8>, ClientError> {
        self.fetch_bytes("/download_all").await
    }

    /// GET any server path (or absolute URL) as raw bytes.
    pub async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Api { status, message })
}

async fn json_or_error<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(check_status(response).await?.json().await?)
}
