use crate::storage::{Storage, SIGNED_URL_TTL, UPLOADS_PREFIX};
use mediator::Request;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFileQuery {
    #[serde(default)]
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFileResponse {
    pub file_name: String,
    pub url: String,
    pub expires_in: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadFileError {
    #[error("File name is required")]
    FilenameRequired,
    #[error("Invalid file name")]
    InvalidFilename,
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl Request<Result<DownloadFileResponse, DownloadFileError>> for DownloadFileQuery {}

impl crate::cqrs::middleware::Query for DownloadFileQuery {}

impl DownloadFileQuery {
    /// Name relative to the uploads prefix; callers may send either form
    fn relative_name(&self) -> &str {
        let name = self.file_name.trim();
        name.strip_prefix(UPLOADS_PREFIX).unwrap_or(name)
    }

    pub fn validate(&self) -> Result<(), DownloadFileError> {
        let name = self.relative_name();
        if name.is_empty() {
            return Err(DownloadFileError::FilenameRequired);
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(DownloadFileError::InvalidFilename);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(storage))]
pub async fn handle(
    storage: Storage,
    query: DownloadFileQuery,
) -> Result<DownloadFileResponse, DownloadFileError> {
    query.validate()?;

    let file_name = query.relative_name().to_string();
    let key = storage.batch_file_key(&file_name);
    let url = storage.generate_presigned_url(&key, SIGNED_URL_TTL).await?;

    Ok(DownloadFileResponse {
        file_name,
        url,
        expires_in: SIGNED_URL_TTL.as_secs(),
    })
}
