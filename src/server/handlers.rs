//! Endpoint handlers.
//!
//! Each handler validates the request shape, moves the blocking work onto
//! `spawn_blocking`, and turns the service result into JSON.

use super::error::ApiError;
use super::page;
use super::state::AppState;
use crate::bundle::BUNDLE_FILENAME;
use crate::imaging::ImageBackend;
use crate::naming;
use crate::service::{PendingUpload, ProcessingService, ServiceError, UPLOAD_FIELD, UploadPolicy};
use crate::types::{
    RenameRequest, RenameResponse, ReprocessRequest, ReprocessResponse, UploadResponse,
};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Treat absent and empty strings alike.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `POST /upload`: multipart field `files`, one or more images.
///
/// Each part is streamed to a hidden staging file and checked as it arrives:
/// a wrong type, one file too many, or a part growing past the size cap
/// rejects the whole request and removes everything staged so far. Decode
/// failures during enhancement only drop that file.
pub async fn upload<B>(
    State(state): State<AppState<B>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError>
where
    B: ImageBackend + Send + 'static,
{
    let service = state.service.clone();
    let mut pending = Vec::new();

    if let Err(e) = receive_files(&service, &mut multipart, &mut pending).await {
        for upload in &pending {
            service.discard_upload(upload);
        }
        return Err(e);
    }

    if pending.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }
    tracing::info!(count = pending.len(), "upload received");

    let processed = tokio::task::spawn_blocking(move || {
        let mut stored = Vec::with_capacity(pending.len());
        let mut pending = pending.into_iter();
        while let Some(upload) = pending.next() {
            match service.commit_upload(upload) {
                Ok(upload) => stored.push(upload),
                Err(e) => {
                    pending.for_each(|rest| service.discard_upload(&rest));
                    return Err(e);
                }
            }
        }
        Ok::<_, ServiceError>(service.enhance_batch(&stored))
    })
    .await?
    .map_err(|e| ApiError::from_service(e, "Upload failed"))?;

    Ok(Json(UploadResponse {
        processed_files: processed,
    }))
}

/// Stage every `files` part, pushing each onto `pending` as soon as its
/// staging file exists so the caller can clean up on failure.
async fn receive_files<B: ImageBackend>(
    service: &ProcessingService<B>,
    multipart: &mut Multipart,
    pending: &mut Vec<PendingUpload>,
) -> Result<(), ApiError> {
    let policy = service.policy();

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            tracing::debug!(field = ?field.name(), "ignoring non-file form field");
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        policy.check_type(&filename, field.content_type())?;
        policy.check_count(pending.len() + 1)?;

        let upload = service
            .begin_upload(&filename)
            .map_err(|e| ApiError::from_service(e, "Upload failed"))?;
        let path = upload.path().to_path_buf();
        pending.push(upload);

        let size = stream_to_file(&mut field, &path, &filename, policy).await?;
        tracing::debug!(file = %filename, size, "part received");
    }
    Ok(())
}

/// Copy one part to `path` chunk by chunk, failing as soon as the running
/// total passes the per-file cap.
async fn stream_to_file(
    field: &mut Field<'_>,
    path: &Path,
    filename: &str,
    policy: &UploadPolicy,
) -> Result<u64, ApiError> {
    let io_failed = |e: std::io::Error| ApiError::from_service(e.into(), "Upload failed");

    let mut file = tokio::fs::File::create(path).await.map_err(io_failed)?;
    let mut written: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        written += chunk.len() as u64;
        policy.check_size(filename, written)?;
        file.write_all(&chunk).await.map_err(io_failed)?;
    }
    file.flush().await.map_err(io_failed)?;
    Ok(written)
}

/// `POST /reprocess`: composite an overlay onto a result.
pub async fn reprocess<B>(
    State(state): State<AppState<B>>,
    payload: Result<Json<ReprocessRequest>, JsonRejection>,
) -> Result<Json<ReprocessResponse>, ApiError>
where
    B: ImageBackend + Send + 'static,
{
    let Json(request) = payload?;
    let (Some(target), Some(overlay)) = (
        required(request.target_filename),
        required(request.overlay),
    ) else {
        return Err(ApiError::bad_request("Missing targetFilename or overlay"));
    };

    let service = state.service.clone();
    let url = tokio::task::spawn_blocking(move || service.reprocess(&target, &overlay))
        .await?
        .map_err(|e| ApiError::from_service(e, "Processing failed"))?;

    Ok(Json(ReprocessResponse { success: true, url }))
}

/// `POST /rename`: rename a result, keeping its extension.
pub async fn rename<B>(
    State(state): State<AppState<B>>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<RenameResponse>, ApiError>
where
    B: ImageBackend + Send + 'static,
{
    let Json(request) = payload?;
    let (Some(old), Some(new)) = (
        required(request.old_filename),
        required(request.new_filename),
    ) else {
        return Err(ApiError::bad_request("Missing oldFilename or newFilename"));
    };

    let service = state.service.clone();
    let new_filename = tokio::task::spawn_blocking(move || service.rename(&old, &new))
        .await?
        .map_err(|e| ApiError::from_service(e, "Rename failed"))?;

    Ok(Json(RenameResponse {
        success: true,
        url: naming::results_url(&new_filename),
        new_filename,
    }))
}

/// `GET /download_all`: zip of every result.
pub async fn download_all<B>(State(state): State<AppState<B>>) -> Result<impl IntoResponse, ApiError>
where
    B: ImageBackend + Send + 'static,
{
    let service = state.service.clone();
    let bytes = tokio::task::spawn_blocking(move || service.bundle_all())
        .await?
        .map_err(|e| ApiError::from_service(e, "Failed to create archive"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={BUNDLE_FILENAME}"),
            ),
        ],
        bytes,
    ))
}

/// `GET /`: upload form and gallery.
pub async fn index<B>(State(state): State<AppState<B>>) -> Result<Html<String>, ApiError>
where
    B: ImageBackend + Send + 'static,
{
    let service = state.service.clone();
    let results = tokio::task::spawn_blocking(move || service.list_results()).await??;
    Ok(Html(page::render_index(&results).into_string()))
}
