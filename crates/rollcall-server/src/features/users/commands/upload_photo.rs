use mediator::Request;
use sqlx::PgPool;

use crate::features::shared::photos::{
    replace_photo, validate_photo, PhotoOwner, PhotoUploadError, PhotoUploadResponse,
};
use crate::features::shared::UploadedFile;
use crate::storage::Storage;

/// Attach (or replace) an account photo
#[derive(Debug, Clone)]
pub struct UploadUserPhotoCommand {
    pub user_id: Option<i64>,
    pub photo: Option<UploadedFile>,
}

pub type UploadUserPhotoError = PhotoUploadError;

impl Request<Result<PhotoUploadResponse, UploadUserPhotoError>> for UploadUserPhotoCommand {}

impl crate::cqrs::middleware::Command for UploadUserPhotoCommand {}

impl UploadUserPhotoCommand {
    pub fn validate(&self) -> Result<(), UploadUserPhotoError> {
        validate_photo(PhotoOwner::User, self.user_id, self.photo.as_ref())
    }
}

#[tracing::instrument(skip(pool, storage, command), fields(user_id = ?command.user_id))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: UploadUserPhotoCommand,
) -> Result<PhotoUploadResponse, UploadUserPhotoError> {
    command.validate()?;

    let (Some(user_id), Some(photo)) = (command.user_id, command.photo) else {
        return Err(PhotoUploadError::MissingInput("user"));
    };

    replace_photo(&pool, &storage, PhotoOwner::User, user_id, photo).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_photo_limit() {
        let command = UploadUserPhotoCommand {
            user_id: Some(1),
            photo: Some(UploadedFile {
                file_name: "logo.png".to_string(),
                content_type: Some("image/png".to_string()),
                data: vec![0u8; 500 * 1024 + 1],
            }),
        };
        assert_eq!(
            command.validate().unwrap_err().to_string(),
            "File size must be less than 500KB"
        );
    }
}
