//! Chunked persistence of validated students
//!
//! Records are written in fixed-size chunks, one multi-row INSERT per chunk,
//! strictly one after another. A failed chunk is reported and skipped; chunks
//! already written stay written.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};

use super::models::{ImportResult, StudentField, StudentRecord};

/// Number of records per INSERT
pub const CHUNK_SIZE: usize = 100;

/// Destination for validated students
#[async_trait]
pub trait StudentSink: Send + Sync {
    /// Insert one chunk and return how many rows the store accepted.
    async fn insert_chunk(&self, chunk: &[StudentRecord]) -> Result<u64>;
}

/// Writes into the `students` table
#[derive(Clone)]
pub struct PgStudentSink {
    pool: PgPool,
}

impl PgStudentSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentSink for PgStudentSink {
    async fn insert_chunk(&self, chunk: &[StudentRecord]) -> Result<u64> {
        if chunk.is_empty() {
            return Ok(0);
        }

        let columns = StudentField::REQUIRED
            .iter()
            .map(|f| f.column())
            .collect::<Vec<_>>()
            .join(", ");

        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO students ({}, school_id, distributor, created_at) ",
            columns
        ));

        query_builder.push_values(chunk.iter(), |mut b, record| {
            for field in StudentField::REQUIRED {
                b.push_bind(record.value(field));
            }
            b.push_bind(record.school_id)
                .push_bind(record.distributor.as_deref())
                .push_bind(record.created_at);
        });

        let result = query_builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}

/// Insert `records` through `sink` in chunks of [`CHUNK_SIZE`].
///
/// `imported` counts only rows the store confirmed. Each failing chunk adds
/// `"Chunk {n}: {error}"` (1-based) to `errors` and the next chunk is still
/// attempted.
pub async fn persist_in_chunks(sink: &dyn StudentSink, records: &[StudentRecord]) -> ImportResult {
    let total_chunks = records.len().div_ceil(CHUNK_SIZE);
    let mut result = ImportResult {
        imported: 0,
        total: records.len(),
        errors: Vec::new(),
    };

    for (chunk_idx, chunk) in records.chunks(CHUNK_SIZE).enumerate() {
        let chunk_no = chunk_idx + 1;

        match sink.insert_chunk(chunk).await {
            Ok(inserted) => {
                result.imported += inserted;
                info!(
                    chunk = chunk_no,
                    total_chunks,
                    submitted = chunk.len(),
                    inserted,
                    "Chunk stored"
                );
            },
            Err(e) => {
                warn!(chunk = chunk_no, total_chunks, error = %format!("{e:#}"), "Chunk insert failed");
                result.errors.push(format!("Chunk {}: {:#}", chunk_no, e));
            },
        }
    }

    result
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// In-memory sink that records chunk sizes and fails selected chunks
    #[derive(Default)]
    pub struct RecordingSink {
        pub chunk_sizes: Mutex<Vec<usize>>,
        /// 1-based chunk numbers that fail
        pub fail_chunks: Vec<usize>,
        /// Accept at most this many rows per chunk
        pub accept_limit: Option<u64>,
    }

    impl RecordingSink {
        pub fn failing(chunks: &[usize]) -> Self {
            Self {
                fail_chunks: chunks.to_vec(),
                ..Self::default()
            }
        }

        pub fn sizes(&self) -> Vec<usize> {
            self.chunk_sizes.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl StudentSink for RecordingSink {
        async fn insert_chunk(&self, chunk: &[StudentRecord]) -> Result<u64> {
            let chunk_no = {
                let mut sizes = self
                    .chunk_sizes
                    .lock()
                    .map_err(|_| anyhow::anyhow!("poisoned"))?;
                sizes.push(chunk.len());
                sizes.len()
            };

            if self.fail_chunks.contains(&chunk_no) {
                anyhow::bail!("duplicate key value violates unique constraint");
            }

            let len = chunk.len() as u64;
            Ok(self.accept_limit.map_or(len, |limit| len.min(limit)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingSink;
    use super::*;
    use chrono::Utc;

    fn records(n: usize) -> Vec<StudentRecord> {
        (0..n)
            .map(|i| StudentRecord {
                student_name: format!("Student {i}"),
                father_name: "Father".to_string(),
                mobile_no: "1234567890".to_string(),
                address: "1 Road".to_string(),
                class: "5th".to_string(),
                session: "2024-2025".to_string(),
                admission_no: format!("ADM{i:04}"),
                blood_group: "O+".to_string(),
                school_id: Some(1),
                distributor: None,
                created_at: Utc::now(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_exactly_one_chunk_for_100() {
        let sink = RecordingSink::default();
        let result = persist_in_chunks(&sink, &records(100)).await;
        assert_eq!(sink.sizes(), vec![100]);
        assert_eq!(result.imported, 100);
        assert_eq!(result.total, 100);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_two_chunks_for_101() {
        let sink = RecordingSink::default();
        let result = persist_in_chunks(&sink, &records(101)).await;
        assert_eq!(sink.sizes(), vec![100, 1]);
        assert_eq!(result.imported, 101);
    }

    #[tokio::test]
    async fn test_failed_second_chunk_keeps_first() {
        let sink = RecordingSink::failing(&[2]);
        let result = persist_in_chunks(&sink, &records(101)).await;
        assert_eq!(result.imported, 100);
        assert_eq!(result.total, 101);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Chunk 2: "));
        assert!(result.errors[0].contains("duplicate key"));
    }

    #[tokio::test]
    async fn test_processing_continues_after_failure() {
        let sink = RecordingSink::failing(&[1]);
        let result = persist_in_chunks(&sink, &records(250)).await;
        assert_eq!(sink.sizes(), vec![100, 100, 50]);
        assert_eq!(result.imported, 150);
        assert_eq!(result.errors, vec!["Chunk 1: duplicate key value violates unique constraint"]);
    }

    #[tokio::test]
    async fn test_imported_counts_only_confirmed_rows() {
        let sink = RecordingSink {
            accept_limit: Some(90),
            ..RecordingSink::default()
        };
        let result = persist_in_chunks(&sink, &records(150)).await;
        assert_eq!(result.imported, 90 + 50);
        assert_eq!(result.total, 150);
    }

    #[tokio::test]
    async fn test_all_chunks_failing_is_total_failure() {
        let sink = RecordingSink::failing(&[1, 2]);
        let result = persist_in_chunks(&sink, &records(120)).await;
        assert_eq!(result.imported, 0);
        assert!(result.is_total_failure());
    }
}
