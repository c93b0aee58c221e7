//! Batch file API routes
//!
//! - `POST /api/v1/files` - Upload an Excel, CSV or ZIP file (multipart `file`)
//! - `GET /api/v1/files` - List uploaded files, newest first
//! - `POST /api/v1/files/download` - Signed download URL for `{ fileName }`

use crate::api::response::{internal_error, validation_error, ApiResponse, ErrorResponse};
use crate::features::shared::MultipartForm;
use crate::features::FeatureState;
use crate::storage::Storage;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::{
    commands::{UploadFileCommand, UploadFileError},
    queries::{DownloadFileError, DownloadFileQuery, ListFilesError, ListFilesQuery},
};

pub fn files_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_files).post(upload_file))
        .route("/download", post(download_file))
}

#[tracing::instrument(skip(storage, multipart))]
async fn upload_file(
    State(storage): State<Storage>,
    multipart: Multipart,
) -> Result<Response, FileApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form
        .take_file(&["file"])
        .ok_or(FileApiError::Upload(UploadFileError::FileRequired))?;

    let command = UploadFileCommand {
        file_name: file.file_name,
        content: file.data,
        content_type: file.content_type,
    };

    let response = super::commands::upload::handle(storage, command).await?;

    tracing::info!(
        key = %response.key,
        size = response.size,
        "File uploaded via API"
    );

    Ok(Json(json!({
        "success": true,
        "fileName": response.file_name,
        "message": "File uploaded successfully",
    }))
    .into_response())
}

#[tracing::instrument(skip(storage))]
async fn list_files(State(storage): State<Storage>) -> Result<Response, FileApiError> {
    let files = super::queries::list::handle(storage, ListFilesQuery::default()).await?;

    Ok(ApiResponse::list(files).into_response())
}

#[tracing::instrument(skip(storage, query))]
async fn download_file(
    State(storage): State<Storage>,
    Json(query): Json<DownloadFileQuery>,
) -> Result<Response, FileApiError> {
    let response = super::queries::download::handle(storage, query).await?;

    tracing::debug!(
        file_name = %response.file_name,
        expires_in = response.expires_in,
        "File download URL generated via API"
    );

    Ok(ApiResponse::success(response).into_response())
}

#[derive(Debug)]
enum FileApiError {
    Multipart(MultipartError),
    Upload(UploadFileError),
    List(ListFilesError),
    Download(DownloadFileError),
}

impl From<MultipartError> for FileApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<UploadFileError> for FileApiError {
    fn from(err: UploadFileError) -> Self {
        Self::Upload(err)
    }
}

impl From<ListFilesError> for FileApiError {
    fn from(err: ListFilesError) -> Self {
        Self::List(err)
    }
}

impl From<DownloadFileError> for FileApiError {
    fn from(err: DownloadFileError) -> Self {
        Self::Download(err)
    }
}

fn storage_error(err: &anyhow::Error, message: &str) -> Response {
    tracing::error!(error = %format!("{err:#}"), "{}", message);
    internal_error("STORAGE_ERROR", message)
}

impl IntoResponse for FileApiError {
    fn into_response(self) -> Response {
        match self {
            FileApiError::Multipart(e) => ErrorResponse::new("INVALID_MULTIPART", e.body_text())
                .into_response_with(StatusCode::BAD_REQUEST),

            FileApiError::Upload(UploadFileError::Storage(e)) => {
                storage_error(&e, "Failed to upload file")
            },
            FileApiError::Upload(e) => validation_error(e.to_string()),

            FileApiError::List(ListFilesError::Storage(e)) => {
                storage_error(&e, "Failed to list files")
            },

            FileApiError::Download(DownloadFileError::Storage(e)) => {
                storage_error(&e, "Failed to generate download URL")
            },
            FileApiError::Download(e) => validation_error(e.to_string()),
        }
    }
}
