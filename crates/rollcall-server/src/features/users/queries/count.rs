use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountUsersQuery {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountUsersResponse {
    pub count: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum CountUsersError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<CountUsersResponse, CountUsersError>> for CountUsersQuery {}

impl crate::cqrs::middleware::Query for CountUsersQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    _query: CountUsersQuery,
) -> Result<CountUsersResponse, CountUsersError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;

    Ok(CountUsersResponse { count })
}
