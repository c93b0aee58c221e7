use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::photos::signed_or_none;
use crate::features::students::scope::{fetch_students, ScopeError, StudentFilter};
use crate::storage::Storage;

/// Students in scope that have a photo, with download links
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentPhotosQuery {
    #[serde(flatten)]
    pub filter: StudentFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPhoto {
    pub id: i64,
    pub student_name: String,
    pub admission_no: String,
    pub class: String,
    pub session: Option<String>,
    pub photo_name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentPhotosResponse {
    pub count: usize,
    pub photos: Vec<StudentPhoto>,
}

#[derive(Debug, thiserror::Error)]
pub enum StudentPhotosError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("No student photos found")]
    NoPhotos,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<StudentPhotosResponse, StudentPhotosError>> for StudentPhotosQuery {}

impl crate::cqrs::middleware::Query for StudentPhotosQuery {}

impl StudentPhotosQuery {
    pub fn validate(&self) -> Result<(), StudentPhotosError> {
        Ok(self.filter.validate()?)
    }
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    query: StudentPhotosQuery,
) -> Result<StudentPhotosResponse, StudentPhotosError> {
    query.validate()?;

    let scope = query.filter.resolve(&pool).await?;
    let rows = fetch_students(&pool, &scope, true).await?;

    let mut photos = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(key) = row.photo_path.as_deref() else {
            continue;
        };
        let photo_url = signed_or_none(&storage, key).await;
        photos.push(StudentPhoto {
            photo_name: row
                .photo_name
                .clone()
                .unwrap_or_else(|| format!("student-{}.jpg", row.id)),
            id: row.id,
            student_name: row.student_name,
            admission_no: row.admission_no,
            class: row.class,
            session: row.session,
            photo_url,
        });
    }

    if photos.is_empty() {
        return Err(StudentPhotosError::NoPhotos);
    }

    Ok(StudentPhotosResponse {
        count: photos.len(),
        photos,
    })
}
