use mediator::Request;
use sqlx::PgPool;

use crate::features::shared::photos::{
    replace_photo, validate_photo, PhotoOwner, PhotoUploadError, PhotoUploadResponse,
};
use crate::features::shared::UploadedFile;
use crate::storage::Storage;

/// Attach (or replace) a student's photo
#[derive(Debug, Clone)]
pub struct UploadStudentPhotoCommand {
    pub student_id: Option<i64>,
    pub photo: Option<UploadedFile>,
}

pub type UploadStudentPhotoError = PhotoUploadError;

impl Request<Result<PhotoUploadResponse, UploadStudentPhotoError>> for UploadStudentPhotoCommand {}

impl crate::cqrs::middleware::Command for UploadStudentPhotoCommand {}

impl UploadStudentPhotoCommand {
    pub fn validate(&self) -> Result<(), UploadStudentPhotoError> {
        validate_photo(PhotoOwner::Student, self.student_id, self.photo.as_ref())
    }
}

#[tracing::instrument(skip(pool, storage, command), fields(student_id = ?command.student_id))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: UploadStudentPhotoCommand,
) -> Result<PhotoUploadResponse, UploadStudentPhotoError> {
    command.validate()?;

    let (Some(student_id), Some(photo)) = (command.student_id, command.photo) else {
        return Err(PhotoUploadError::MissingInput("student"));
    };

    replace_photo(&pool, &storage, PhotoOwner::Student, student_id, photo).await
}
