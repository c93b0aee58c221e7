//! Photo replacement for students and user accounts
//!
//! Both owners store the blob key in `photo_path` and the client file name
//! in `photo_name`. A new photo is uploaded first and the row updated second;
//! if the row update fails the fresh blob is removed again. The superseded
//! blob is deleted in the background once the row points at the new one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::multipart::UploadedFile;
use super::validation::{
    validate_image, ImageValidationError, MAX_STUDENT_PHOTO_BYTES, MAX_USER_PHOTO_BYTES,
};
use crate::storage::{key_extension, Storage};

/// Which table a photo belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoOwner {
    Student,
    User,
}

impl PhotoOwner {
    fn table(self) -> &'static str {
        match self {
            PhotoOwner::Student => "students",
            PhotoOwner::User => "users",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhotoOwner::Student => "Student",
            PhotoOwner::User => "User",
        }
    }

    pub fn max_bytes(self) -> usize {
        match self {
            PhotoOwner::Student => MAX_STUDENT_PHOTO_BYTES,
            PhotoOwner::User => MAX_USER_PHOTO_BYTES,
        }
    }

    fn key(self, storage: &Storage, id: i64, millis: i64, ext: &str) -> String {
        match self {
            PhotoOwner::Student => storage.student_photo_key(id, millis, ext),
            PhotoOwner::User => storage.user_photo_key(id, millis, ext),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUploadResponse {
    pub id: i64,
    pub photo_path: String,
    pub photo_name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoUploadError {
    #[error("Photo and {0} ID are required")]
    MissingInput(&'static str),

    #[error(transparent)]
    Image(#[from] ImageValidationError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Failed to upload photo: {0:#}")]
    Upload(anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks that need neither the database nor the blob store
pub fn validate_photo(
    owner: PhotoOwner,
    id: Option<i64>,
    file: Option<&UploadedFile>,
) -> Result<(), PhotoUploadError> {
    let (Some(_), Some(file)) = (id, file) else {
        return Err(PhotoUploadError::MissingInput(owner_noun(owner)));
    };
    validate_image(file.content_type.as_deref(), file.data.len(), owner.max_bytes())?;
    Ok(())
}

fn owner_noun(owner: PhotoOwner) -> &'static str {
    match owner {
        PhotoOwner::Student => "student",
        PhotoOwner::User => "user",
    }
}

/// Extension for the stored key: the file's own, else the image subtype,
/// else `jpg`.
pub fn photo_extension(file: &UploadedFile) -> String {
    if let Some(ext) = key_extension(&file.file_name) {
        return ext;
    }

    match file
        .content_type
        .as_deref()
        .and_then(|ct| ct.split('/').nth(1))
        .map(|sub| sub.split(';').next().unwrap_or(sub).trim().to_ascii_lowercase())
    {
        Some(sub) if sub == "jpeg" => "jpg".to_string(),
        Some(sub) if !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()) => sub,
        _ => "jpg".to_string(),
    }
}

/// Presign `key`, logging and swallowing failures
pub async fn signed_or_none(storage: &Storage, key: &str) -> Option<String> {
    match storage.signed_url(key).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(key = %key, error = %format!("{e:#}"), "Failed to sign photo URL");
            None
        },
    }
}

/// Store `file` as the photo of row `id` of `owner`.
#[tracing::instrument(skip(pool, storage, file), fields(owner = owner.label(), size = file.data.len()))]
pub async fn replace_photo(
    pool: &PgPool,
    storage: &Storage,
    owner: PhotoOwner,
    id: i64,
    file: UploadedFile,
) -> Result<PhotoUploadResponse, PhotoUploadError> {
    validate_photo(owner, Some(id), Some(&file))?;

    let existing: Option<(Option<String>,)> =
        sqlx::query_as(&format!("SELECT photo_path FROM {} WHERE id = $1", owner.table()))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    let (previous,) = existing.ok_or(PhotoUploadError::NotFound(owner.label()))?;

    let ext = photo_extension(&file);
    let key = owner.key(storage, id, Utc::now().timestamp_millis(), &ext);
    let photo_name = file.file_name.clone();

    storage
        .upload(&key, file.data, file.content_type)
        .await
        .map_err(PhotoUploadError::Upload)?;

    let updated = sqlx::query(&format!(
        "UPDATE {} SET photo_path = $1, photo_name = $2, updated_at = NOW() WHERE id = $3",
        owner.table()
    ))
    .bind(&key)
    .bind(&photo_name)
    .bind(id)
    .execute(pool)
    .await;

    match updated {
        Ok(result) if result.rows_affected() > 0 => {},
        Ok(_) => {
            discard_blob(storage, &key).await;
            return Err(PhotoUploadError::NotFound(owner.label()));
        },
        Err(e) => {
            discard_blob(storage, &key).await;
            return Err(PhotoUploadError::Database(e));
        },
    }

    if let Some(old) = previous.filter(|old| *old != key) {
        storage.spawn_delete(old);
    }

    tracing::info!(id, key = %key, "Photo replaced");

    Ok(PhotoUploadResponse {
        id,
        photo_url: signed_or_none(storage, &key).await,
        photo_path: key,
        photo_name,
    })
}

async fn discard_blob(storage: &Storage, key: &str) {
    if let Err(e) = storage.delete(key).await {
        tracing::warn!(key = %key, error = %format!("{e:#}"), "Failed to remove orphaned photo");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content_type: Option<&str>, size: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            data: vec![0u8; size],
        }
    }

    #[test]
    fn test_missing_input() {
        let err = validate_photo(PhotoOwner::Student, None, None).unwrap_err();
        assert_eq!(err.to_string(), "Photo and student ID are required");

        let f = file("a.jpg", Some("image/jpeg"), 10);
        let err = validate_photo(PhotoOwner::User, None, Some(&f)).unwrap_err();
        assert_eq!(err.to_string(), "Photo and user ID are required");
    }

    #[test]
    fn test_size_limits_differ_by_owner() {
        let f = file("a.jpg", Some("image/jpeg"), 600 * 1024);
        assert!(validate_photo(PhotoOwner::Student, Some(1), Some(&f)).is_ok());

        let err = validate_photo(PhotoOwner::User, Some(1), Some(&f)).unwrap_err();
        assert_eq!(err.to_string(), "File size must be less than 500KB");
    }

    #[test]
    fn test_rejects_non_image() {
        let f = file("a.pdf", Some("application/pdf"), 10);
        assert!(matches!(
            validate_photo(PhotoOwner::Student, Some(1), Some(&f)),
            Err(PhotoUploadError::Image(ImageValidationError::NotAnImage))
        ));
    }

    #[test]
    fn test_photo_extension() {
        assert_eq!(photo_extension(&file("Me.PNG", Some("image/png"), 1)), "png");
        assert_eq!(photo_extension(&file("blob", Some("image/jpeg"), 1)), "jpg");
        assert_eq!(photo_extension(&file("blob", Some("image/webp"), 1)), "webp");
        assert_eq!(photo_extension(&file("blob", Some("image/svg+xml"), 1)), "jpg");
        assert_eq!(photo_extension(&file("blob", None, 1)), "jpg");
    }

    #[test]
    fn test_photo_extension_ignores_path_like_names() {
        let f = file("me./../../uploads/evil", Some("image/png"), 1);
        assert_eq!(photo_extension(&f), "png");

        let f = file("me.jp g", None, 1);
        assert_eq!(photo_extension(&f), "jpg");

        let f = file("a.b/..", Some("image/gif"), 1);
        assert_eq!(photo_extension(&f), "gif");
    }
}
