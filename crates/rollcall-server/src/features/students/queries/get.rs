use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::students::types::{StudentDto, StudentRow, STUDENT_COLUMNS};
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStudentQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetStudentError {
    #[error("Invalid student ID")]
    InvalidId,
    #[error("Student not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<StudentDto, GetStudentError>> for GetStudentQuery {}

impl crate::cqrs::middleware::Query for GetStudentQuery {}

impl GetStudentQuery {
    pub fn validate(&self) -> Result<(), GetStudentError> {
        if self.id <= 0 {
            return Err(GetStudentError::InvalidId);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    query: GetStudentQuery,
) -> Result<StudentDto, GetStudentError> {
    query.validate()?;

    let row = sqlx::query_as::<_, StudentRow>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
    ))
    .bind(query.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(GetStudentError::NotFound)?;

    Ok(StudentDto::with_signed_photo(&storage, row).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_non_positive_id() {
        assert!(GetStudentQuery { id: 9 }.validate().is_ok());
        assert!(matches!(
            GetStudentQuery { id: -1 }.validate(),
            Err(GetStudentError::InvalidId)
        ));
    }
}
