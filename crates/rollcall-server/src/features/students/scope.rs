//! School / batch selection shared by the list, export and photo queries

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::types::{StudentRow, STUDENT_COLUMNS};
use crate::features::shared::validation::{is_present, normalize_email, parse_id};

/// Query-string filter: `schoolId` or `email` picks the school, `batch`
/// narrows to one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("School ID or email is required for filtering")]
    Missing,

    #[error("Invalid school ID")]
    InvalidSchoolId,

    #[error("No active school found for this email")]
    UnknownEmail,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A resolved selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentScope {
    pub school_id: i64,
    pub batch: Option<String>,
}

impl StudentScope {
    /// Label used in export file names
    pub fn batch_label(&self) -> &str {
        self.batch.as_deref().unwrap_or("all")
    }
}

impl StudentFilter {
    /// Checks that can run without the database
    pub fn validate(&self) -> Result<(), ScopeError> {
        match self.school_id.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) if parse_id(raw).is_none() => Err(ScopeError::InvalidSchoolId),
            Some(_) => Ok(()),
            None if is_present(self.email.as_deref()) => Ok(()),
            None => Err(ScopeError::Missing),
        }
    }

    fn batch(&self) -> Option<String> {
        self.batch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
    }

    /// Turn the filter into a school id. `schoolId` wins over `email`.
    pub async fn resolve(&self, pool: &PgPool) -> Result<StudentScope, ScopeError> {
        self.validate()?;

        if let Some(school_id) = self.school_id.as_deref().and_then(parse_id) {
            return Ok(StudentScope {
                school_id,
                batch: self.batch(),
            });
        }

        let email = normalize_email(self.email.as_deref().unwrap_or_default());
        let school_id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM users WHERE email = $1 AND status = 'Active' ORDER BY id LIMIT 1",
        )
        .bind(&email)
        .fetch_optional(pool)
        .await?;

        let school_id = school_id.ok_or(ScopeError::UnknownEmail)?;
        tracing::debug!(school_id, "Resolved school from email");

        Ok(StudentScope {
            school_id,
            batch: self.batch(),
        })
    }
}

/// Students in `scope`, newest first. A batch matches its own session and
/// students with no session.
pub async fn fetch_students(
    pool: &PgPool,
    scope: &StudentScope,
    with_photo_only: bool,
) -> Result<Vec<StudentRow>, sqlx::Error> {
    let photo_clause = if with_photo_only {
        " AND photo_path IS NOT NULL"
    } else {
        ""
    };

    let sql = format!(
        "SELECT {STUDENT_COLUMNS} FROM students \
         WHERE school_id = $1 AND ($2::text IS NULL OR session = $2 OR session IS NULL){photo_clause} \
         ORDER BY created_at DESC, id DESC"
    );

    sqlx::query_as::<_, StudentRow>(&sql)
        .bind(scope.school_id)
        .bind(scope.batch.as_deref())
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(school_id: Option<&str>, email: Option<&str>) -> StudentFilter {
        StudentFilter {
            school_id: school_id.map(str::to_string),
            email: email.map(str::to_string),
            batch: None,
        }
    }

    #[test]
    fn test_requires_school_or_email() {
        assert!(matches!(filter(None, None).validate(), Err(ScopeError::Missing)));
        assert!(matches!(
            filter(Some(" "), Some("")).validate(),
            Err(ScopeError::Missing)
        ));
        assert!(filter(Some("7"), None).validate().is_ok());
        assert!(filter(None, Some("school@example.com")).validate().is_ok());
    }

    #[test]
    fn test_rejects_non_numeric_school_id() {
        assert!(matches!(
            filter(Some("abc"), None).validate(),
            Err(ScopeError::InvalidSchoolId)
        ));
        assert!(matches!(
            filter(Some("0"), Some("a@b.c")).validate(),
            Err(ScopeError::InvalidSchoolId)
        ));
    }

    #[test]
    fn test_batch_is_trimmed() {
        let mut f = filter(Some("1"), None);
        f.batch = Some("  ".to_string());
        assert_eq!(f.batch(), None);
        f.batch = Some(" 2024-25 ".to_string());
        assert_eq!(f.batch().as_deref(), Some("2024-25"));
    }

    #[test]
    fn test_batch_label() {
        let scope = StudentScope {
            school_id: 1,
            batch: None,
        };
        assert_eq!(scope.batch_label(), "all");
    }
}
