use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteStudentCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteStudentResponse {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteStudentError {
    #[error("Invalid student ID")]
    InvalidId,
    #[error("Student not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DeleteStudentResponse, DeleteStudentError>> for DeleteStudentCommand {}

impl crate::cqrs::middleware::Command for DeleteStudentCommand {}

impl DeleteStudentCommand {
    pub fn validate(&self) -> Result<(), DeleteStudentError> {
        if self.id <= 0 {
            return Err(DeleteStudentError::InvalidId);
        }
        Ok(())
    }
}

/// Delete the row, then drop its photo in the background.
#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: DeleteStudentCommand,
) -> Result<DeleteStudentResponse, DeleteStudentError> {
    command.validate()?;

    let deleted: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM students WHERE id = $1 RETURNING photo_path")
            .bind(command.id)
            .fetch_optional(&pool)
            .await?;

    let (photo_path,) = deleted.ok_or(DeleteStudentError::NotFound)?;

    if let Some(key) = photo_path {
        storage.spawn_delete(key);
    }

    tracing::info!(student_id = command.id, "Student deleted");

    Ok(DeleteStudentResponse {
        id: command.id,
        deleted: true,
    })
}
