use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::error_helpers::is_unique_violation;
use crate::features::students::types::{StudentDto, StudentFields, StudentRow, STUDENT_COLUMNS};
use crate::import::StudentField;
use crate::storage::Storage;

/// Replace the eight editable fields of a student
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentCommand {
    /// Set from the path
    #[serde(skip)]
    pub id: i64,

    #[serde(flatten)]
    pub fields: StudentFields,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateStudentError {
    #[error("Invalid student ID")]
    InvalidId,

    #[error("All fields are required")]
    MissingFields,

    #[error("Student not found")]
    NotFound,

    #[error("A student with this admission number already exists for this school")]
    DuplicateAdmissionNo,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<StudentDto, UpdateStudentError>> for UpdateStudentCommand {}

impl crate::cqrs::middleware::Command for UpdateStudentCommand {}

impl UpdateStudentCommand {
    pub fn validate(&self) -> Result<(), UpdateStudentError> {
        if self.id <= 0 {
            return Err(UpdateStudentError::InvalidId);
        }
        if !self.fields.is_complete() {
            return Err(UpdateStudentError::MissingFields);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, storage, command), fields(student_id = command.id))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: UpdateStudentCommand,
) -> Result<StudentDto, UpdateStudentError> {
    command.validate()?;

    let assignments = StudentField::REQUIRED
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = ${}", f.column(), i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE students SET {assignments}, updated_at = NOW() WHERE id = $9 \
         RETURNING {STUDENT_COLUMNS}"
    );

    let values = command.fields.values();
    let mut query = sqlx::query_as::<_, StudentRow>(&sql);
    for value in &values {
        query = query.bind(value.as_str());
    }

    let row = query
        .bind(command.id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                UpdateStudentError::DuplicateAdmissionNo
            } else {
                UpdateStudentError::Database(e)
            }
        })?
        .ok_or(UpdateStudentError::NotFound)?;

    tracing::info!("Student updated");

    Ok(StudentDto::with_signed_photo(&storage, row).await)
}
