//! ZIP archive of a school's student photos
//!
//! Photos are fetched one at a time from the blob store. A photo that cannot
//! be fetched is left out of the archive and logged.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use chrono::Utc;
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::features::students::scope::{fetch_students, ScopeError, StudentFilter};
use crate::features::students::types::StudentRow;
use crate::storage::{key_extension, Storage};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoArchiveQuery {
    #[serde(flatten)]
    pub filter: StudentFilter,
}

#[derive(Debug, Clone)]
pub struct PhotoArchive {
    pub file_name: String,
    pub content: Vec<u8>,
    /// Photos written into the archive
    pub included: usize,
    /// Photos that could not be fetched
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoArchiveError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("No student photos found")]
    NoPhotos,
    #[error("None of the student photos could be downloaded")]
    NothingDownloaded,
    #[error("Failed to build archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Failed to build archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<PhotoArchive, PhotoArchiveError>> for PhotoArchiveQuery {}

impl crate::cqrs::middleware::Query for PhotoArchiveQuery {}

impl PhotoArchiveQuery {
    pub fn validate(&self) -> Result<(), PhotoArchiveError> {
        Ok(self.filter.validate()?)
    }
}

/// `{admissionNo}_{id}.{ext}` with path-hostile characters replaced
pub fn archive_entry_name(row: &StudentRow) -> String {
    let admission: String = row
        .admission_no
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let ext = row
        .photo_path
        .as_deref()
        .and_then(key_extension)
        .unwrap_or_else(|| "jpg".to_string());
    format!("{}_{}.{}", admission, row.id, ext)
}

/// Pack `(name, bytes)` entries. Duplicate names keep the first entry.
pub fn build_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, PhotoArchiveError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut seen = HashSet::new();

    for (name, bytes) in entries {
        if !seen.insert(name.as_str()) {
            continue;
        }
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    query: PhotoArchiveQuery,
) -> Result<PhotoArchive, PhotoArchiveError> {
    query.validate()?;

    let scope = query.filter.resolve(&pool).await?;
    let rows = fetch_students(&pool, &scope, true).await?;
    if rows.is_empty() {
        return Err(PhotoArchiveError::NoPhotos);
    }

    let mut entries = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in &rows {
        let Some(key) = row.photo_path.as_deref() else {
            continue;
        };
        match storage.download(key).await {
            Ok(bytes) => entries.push((archive_entry_name(row), bytes)),
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    student_id = row.id,
                    key = %key,
                    error = %format!("{e:#}"),
                    "Skipping photo that could not be downloaded"
                );
            },
        }
    }

    if entries.is_empty() {
        return Err(PhotoArchiveError::NothingDownloaded);
    }

    let content = build_archive(&entries)?;
    let file_name = format!(
        "student_photos_batch_{}_{}.zip",
        scope.batch_label(),
        Utc::now().format("%Y-%m-%d")
    );

    tracing::info!(included = entries.len(), skipped, file_name = %file_name, "Built photo archive");

    Ok(PhotoArchive {
        file_name,
        content,
        included: entries.len(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn row(id: i64, admission_no: &str, photo_path: Option<&str>) -> StudentRow {
        let now = Utc::now();
        StudentRow {
            id,
            student_name: "Asha".to_string(),
            father_name: "Ravi".to_string(),
            mobile_no: "1".to_string(),
            address: "x".to_string(),
            class: "5".to_string(),
            session: None,
            admission_no: admission_no.to_string(),
            blood_group: "O+".to_string(),
            school_id: Some(1),
            distributor: None,
            photo_path: photo_path.map(str::to_string),
            photo_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_entry_name() {
        let r = row(7, "A/10 B", Some("student-photos/7/student-7-1.png"));
        assert_eq!(archive_entry_name(&r), "A_10_B_7.png");

        let r = row(8, "A-11", None);
        assert_eq!(archive_entry_name(&r), "A-11_8.jpg");

        let r = row(9, "A-12", Some("student-photos/9/student-9-0./uploads/evil"));
        assert_eq!(archive_entry_name(&r), "A-12_9.jpg");
    }

    #[test]
    fn test_build_archive_round_trip() {
        let entries = vec![
            ("A-1_1.jpg".to_string(), b"first".to_vec()),
            ("A-2_2.jpg".to_string(), b"second".to_vec()),
            ("A-1_1.jpg".to_string(), b"duplicate".to_vec()),
        ];

        let bytes = build_archive(&entries).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("A-1_1.jpg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "first");
    }
}
