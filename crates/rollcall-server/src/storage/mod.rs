//! S3-compatible blob store for batch files and photos
//!
//! Key layout:
//!
//! - `uploads/{stem}-{millis}.{ext}` for batch files
//! - `student-photos/{id}/student-{id}-{millis}.{ext}` for student photos
//! - `user-photos/{id}/user-{id}-{millis}.{ext}` for account photos
//!
//! Downloads go through presigned GET URLs valid for [`SIGNED_URL_TTL`].

use anyhow::{Context, Result};
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, instrument};

pub mod config;

/// Prefix for uploaded batch files
pub const UPLOADS_PREFIX: &str = "uploads/";

/// Prefix for student photos
pub const STUDENT_PHOTOS_PREFIX: &str = "student-photos/";

/// Prefix for school / distributor account photos
pub const USER_PHOTOS_PREFIX: &str = "user-photos/";

/// Lifetime of every presigned download URL handed to clients.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("bucket", &self.bucket).finish()
    }
}

impl Storage {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!(
            endpoint = ?config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing storage"
        );

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "rollcall-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Storage client initialized for bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<UploadResult> {
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.context("Failed to upload to S3")?;

        info!("Uploaded s3://{}/{}", self.bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            size,
        })
    }

    #[instrument(skip(self))]
    pub async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to download from S3: {}", key))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 response body")?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), self.bucket, key);

        Ok(data)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete from S3: {}", key))?;

        info!("Deleted s3://{}/{}", self.bucket, key);

        Ok(())
    }

    /// Delete `key` on a detached task. Failures are logged and never
    /// reach the caller.
    pub fn spawn_delete(&self, key: String) {
        let storage = self.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.delete(&key).await {
                tracing::warn!(key = %key, error = %format!("{e:#}"), "Background blob delete failed");
            }
        });
    }

    #[instrument(skip(self))]
    pub async fn generate_presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning_config = PresigningConfig::expires_in(expires_in)
            .context("Failed to create presigning config")?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .context("Failed to generate presigned URL")?;

        Ok(presigned_request.uri().to_string())
    }

    /// Presigned URL with the standard client-facing lifetime.
    pub async fn signed_url(&self, key: &str) -> Result<String> {
        self.generate_presigned_url(key, SIGNED_URL_TTL).await
    }

    /// List at most `max_keys` objects under `prefix`.
    #[instrument(skip(self))]
    pub async fn list(&self, prefix: &str, max_keys: Option<i32>) -> Result<Vec<ObjectSummary>> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix);

        if let Some(max) = max_keys {
            request = request.max_keys(max);
        }

        let response = request.send().await.context("Failed to list S3 objects")?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                Some(ObjectSummary {
                    key,
                    size: obj.size().unwrap_or(0),
                    last_modified: obj
                        .last_modified()
                        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos())),
                })
            })
            .collect();

        Ok(objects)
    }

    pub fn batch_file_key(&self, file_name: &str) -> String {
        format!("{}{}", UPLOADS_PREFIX, file_name)
    }

    pub fn student_photo_key(&self, student_id: i64, millis: i64, ext: &str) -> String {
        format!(
            "{}{id}/student-{id}-{millis}.{ext}",
            STUDENT_PHOTOS_PREFIX,
            id = student_id
        )
    }

    pub fn user_photo_key(&self, user_id: i64, millis: i64, ext: &str) -> String {
        format!("{}{id}/user-{id}-{millis}.{ext}", USER_PHOTOS_PREFIX, id = user_id)
    }
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: String,
    pub size: i64,
}

#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectSummary {
    /// File name with the listing prefix removed
    pub fn name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// Extension of `file_name` in lower case, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// [`extension_of`] restricted to ASCII letters and digits, safe to embed in
/// an object key or archive entry name
pub fn key_extension(file_name: &str) -> Option<String> {
    extension_of(file_name).filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
}
