use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::students::scope::{fetch_students, ScopeError, StudentFilter};
use crate::features::students::types::StudentDto;
use crate::storage::Storage;

/// Students of one school, optionally one batch, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListStudentsQuery {
    #[serde(flatten)]
    pub filter: StudentFilter,
}

#[derive(Debug, thiserror::Error)]
pub enum ListStudentsError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<StudentDto>, ListStudentsError>> for ListStudentsQuery {}

impl crate::cqrs::middleware::Query for ListStudentsQuery {}

impl ListStudentsQuery {
    pub fn validate(&self) -> Result<(), ListStudentsError> {
        Ok(self.filter.validate()?)
    }
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    query: ListStudentsQuery,
) -> Result<Vec<StudentDto>, ListStudentsError> {
    query.validate()?;

    let scope = query.filter.resolve(&pool).await?;
    let rows = fetch_students(&pool, &scope, false).await?;

    let mut students = Vec::with_capacity(rows.len());
    for row in rows {
        students.push(StudentDto::with_signed_photo(&storage, row).await);
    }

    tracing::debug!(count = students.len(), school_id = scope.school_id, "Listed students");

    Ok(students)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_scope() {
        let query = ListStudentsQuery::default();
        assert!(matches!(
            query.validate(),
            Err(ListStudentsError::Scope(ScopeError::Missing))
        ));
    }

    #[test]
    fn test_deserializes_flat_query() {
        let query: ListStudentsQuery =
            serde_json::from_value(serde_json::json!({"schoolId": "4", "batch": "2024-25"}))
                .unwrap();
        assert_eq!(query.filter.school_id.as_deref(), Some("4"));
        assert_eq!(query.filter.batch.as_deref(), Some("2024-25"));
    }
}
