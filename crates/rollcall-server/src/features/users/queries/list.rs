use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::users::types::{UserDto, UserRow, USER_COLUMNS};
use crate::storage::Storage;

/// All accounts, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersQuery {}

#[derive(Debug, thiserror::Error)]
pub enum ListUsersError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<UserDto>, ListUsersError>> for ListUsersQuery {}

impl crate::cqrs::middleware::Query for ListUsersQuery {}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    _query: ListUsersQuery,
) -> Result<Vec<UserDto>, ListUsersError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(&pool)
    .await?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        users.push(UserDto::with_signed_photo(&storage, row).await);
    }

    Ok(users)
}
