//! Listing of uploaded batch files
//!
//! The listing hides folder markers and dot files, keeps one entry per file
//! name and puts the newest upload first. Objects without a last-modified
//! time are ordered by the millisecond stamp embedded in their name.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::storage::{ObjectSummary, Storage, UPLOADS_PREFIX};

/// Upper bound on objects fetched per listing
pub const MAX_LISTED_FILES: i32 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilesQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFile {
    pub name: String,
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListFilesError {
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl Request<Result<Vec<BatchFile>, ListFilesError>> for ListFilesQuery {}

impl crate::cqrs::middleware::Query for ListFilesQuery {}

/// Millisecond stamp from a `{stem}-{millis}.{ext}` name
pub fn embedded_millis(name: &str) -> Option<i64> {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let (_, digits) = stem.rsplit_once('-')?;
    if digits.len() < 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn sort_key(file: &BatchFile) -> i64 {
    file.last_modified
        .map(|t| t.timestamp_millis())
        .or_else(|| embedded_millis(&file.name))
        .unwrap_or(0)
}

/// Drop placeholders, de-duplicate by name and order newest first.
pub fn tidy_listing(objects: Vec<ObjectSummary>) -> Vec<BatchFile> {
    let mut seen = HashSet::new();
    let mut files: Vec<BatchFile> = objects
        .into_iter()
        .filter_map(|obj| {
            let name = obj.name().to_string();
            if name.is_empty() || name.starts_with('.') || !seen.insert(name.clone()) {
                return None;
            }
            Some(BatchFile {
                name,
                key: obj.key,
                size: obj.size,
                last_modified: obj.last_modified,
            })
        })
        .collect();

    files.sort_by_key(|f| std::cmp::Reverse(sort_key(f)));
    files
}

#[tracing::instrument(skip(storage))]
pub async fn handle(
    storage: Storage,
    _query: ListFilesQuery,
) -> Result<Vec<BatchFile>, ListFilesError> {
    let objects = storage.list(UPLOADS_PREFIX, Some(MAX_LISTED_FILES)).await?;
    let files = tidy_listing(objects);

    tracing::debug!(count = files.len(), "Listed batch files");

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn object(key: &str, modified_secs: Option<i64>) -> ObjectSummary {
        ObjectSummary {
            key: key.to_string(),
            size: 1,
            last_modified: modified_secs.and_then(|s| Utc.timestamp_opt(s, 0).single()),
        }
    }

    #[test]
    fn test_embedded_millis() {
        assert_eq!(embedded_millis("roster-1700000000000.csv"), Some(1700000000000));
        assert_eq!(embedded_millis("class-5.csv"), None);
        assert_eq!(embedded_millis("roster.csv"), None);
    }

    #[test]
    fn test_drops_placeholders_and_duplicates() {
        let files = tidy_listing(vec![
            object("uploads/", None),
            object("uploads/.emptyFolderPlaceholder", None),
            object("uploads/a-1700000000000.csv", Some(100)),
            object("uploads/a-1700000000000.csv", Some(100)),
        ]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a-1700000000000.csv");
    }

    #[test]
    fn test_newest_first() {
        let files = tidy_listing(vec![
            object("uploads/old.csv", Some(1_000)),
            object("uploads/new.csv", Some(2_000)),
            object("uploads/stamped-1500000.csv", None),
            object("uploads/stamped-1999999999999.xlsx", None),
        ]);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["stamped-1999999999999.xlsx", "new.csv", "old.csv", "stamped-1500000.csv"]
        );
    }
}
