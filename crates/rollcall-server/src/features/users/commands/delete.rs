use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteUserError {
    #[error("Invalid user ID")]
    InvalidId,
    #[error("User not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<DeleteUserResponse, DeleteUserError>> for DeleteUserCommand {}

impl crate::cqrs::middleware::Command for DeleteUserCommand {}

impl DeleteUserCommand {
    pub fn validate(&self) -> Result<(), DeleteUserError> {
        if self.id <= 0 {
            return Err(DeleteUserError::InvalidId);
        }
        Ok(())
    }
}

/// Students of a deleted school keep their rows with `school_id` cleared.
#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: DeleteUserCommand,
) -> Result<DeleteUserResponse, DeleteUserError> {
    command.validate()?;

    let photo_path: Option<Option<String>> =
        sqlx::query_scalar("DELETE FROM users WHERE id = $1 RETURNING photo_path")
            .bind(command.id)
            .fetch_optional(&pool)
            .await?;

    let photo_path = photo_path.ok_or(DeleteUserError::NotFound)?;
    if let Some(key) = photo_path {
        storage.spawn_delete(key);
    }

    tracing::info!(user_id = command.id, "User deleted");

    Ok(DeleteUserResponse {
        id: command.id,
        deleted: true,
    })
}
