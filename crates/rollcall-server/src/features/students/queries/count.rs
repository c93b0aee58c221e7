use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::validation::parse_id;

/// Number of students, across all schools or within one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountStudentsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountStudentsResponse {
    pub count: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum CountStudentsError {
    #[error("Invalid school ID")]
    InvalidSchoolId,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<CountStudentsResponse, CountStudentsError>> for CountStudentsQuery {}

impl crate::cqrs::middleware::Query for CountStudentsQuery {}

impl CountStudentsQuery {
    /// Blank means all schools
    fn school_id(&self) -> Result<Option<i64>, CountStudentsError> {
        match self.school_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_id(raw)
                .map(Some)
                .ok_or(CountStudentsError::InvalidSchoolId),
        }
    }

    pub fn validate(&self) -> Result<(), CountStudentsError> {
        self.school_id().map(|_| ())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: CountStudentsQuery,
) -> Result<CountStudentsResponse, CountStudentsError> {
    let school_id = query.school_id()?;

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM students WHERE ($1::bigint IS NULL OR school_id = $1)",
    )
    .bind(school_id)
    .fetch_one(&pool)
    .await?;

    Ok(CountStudentsResponse { count })
}
