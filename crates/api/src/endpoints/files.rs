//! Attachment endpoints.

use axum::{
    Router,
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use clubdesk_common::{AppError, AppResult, StoredFile};
use serde::Serialize;

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Uploaded file response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub key: String,
    pub size: u64,
    pub content_type: String,
}

impl From<StoredFile> for FileResponse {
    fn from(f: StoredFile) -> Self {
        Self {
            key: f.key,
            size: f.size,
            content_type: f.content_type,
        }
    }
}

/// Upload a file from the `file` part of a multipart form.
async fn upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<FileResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Validation("File name is required".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::Validation("Missing `file` part".to_string()))?;

    let stored = state.file_service.upload(&file_name, &data).await?;
    tracing::debug!(key = %stored.key, user_id = %user.id, "Uploaded attachment");
    Ok(ApiResponse::created(stored.into()))
}

async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let file = state.file_service.download(&key).await?;
    Ok(([(header::CONTENT_TYPE, file.content_type)], file.data))
}

async fn delete(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.file_service.delete(&key).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload))
        .route("/{key}", get(download).delete(delete))
}
