use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::users::types::{UserDto, UserRow, USER_COLUMNS};
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetUserError {
    #[error("Invalid user ID")]
    InvalidId,
    #[error("User not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<UserDto, GetUserError>> for GetUserQuery {}

impl crate::cqrs::middleware::Query for GetUserQuery {}

impl GetUserQuery {
    pub fn validate(&self) -> Result<(), GetUserError> {
        if self.id <= 0 {
            return Err(GetUserError::InvalidId);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    query: GetUserQuery,
) -> Result<UserDto, GetUserError> {
    query.validate()?;

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(query.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(GetUserError::NotFound)?;

    Ok(UserDto::with_signed_photo(&storage, row).await)
}
