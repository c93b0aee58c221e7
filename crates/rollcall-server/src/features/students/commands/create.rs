//! Create student command
//!
//! Adds a single student. Field rules match the batch importer: all eight
//! fields are required after trimming, `schoolId` is coerced to a positive
//! integer or dropped, and a blank distributor is stored as NULL.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::error_helpers::{is_foreign_key_violation, is_unique_violation};
use crate::features::shared::validation::json_id;
use crate::features::students::types::{StudentDto, StudentFields, StudentRow, STUDENT_COLUMNS};
use crate::import::StudentField;

/// Command to create one student
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentCommand {
    #[serde(flatten)]
    pub fields: StudentFields,

    /// Number or numeric string; anything else is stored as NULL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributor: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateStudentError {
    #[error("All fields are required")]
    MissingFields,

    #[error("A student with this admission number already exists for this school")]
    DuplicateAdmissionNo,

    #[error("School not found")]
    UnknownSchool,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<StudentDto, CreateStudentError>> for CreateStudentCommand {}

impl crate::cqrs::middleware::Command for CreateStudentCommand {}

impl CreateStudentCommand {
    pub fn validate(&self) -> Result<(), CreateStudentError> {
        if !self.fields.is_complete() {
            return Err(CreateStudentError::MissingFields);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command))]
pub async fn handle(
    pool: PgPool,
    command: CreateStudentCommand,
) -> Result<StudentDto, CreateStudentError> {
    command.validate()?;

    let school_id = json_id(command.school_id.as_ref());
    let record = command
        .fields
        .to_record(school_id, command.distributor.as_deref())
        .ok_or(CreateStudentError::MissingFields)?;

    let sql = format!(
        "INSERT INTO students ({}, school_id, distributor, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
         RETURNING {STUDENT_COLUMNS}",
        StudentField::REQUIRED
            .iter()
            .map(|f| f.column())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut query = sqlx::query_as::<_, StudentRow>(&sql);
    for field in StudentField::REQUIRED {
        query = query.bind(record.value(field));
    }

    let row = query
        .bind(record.school_id)
        .bind(record.distributor.as_deref())
        .bind(record.created_at)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CreateStudentError::DuplicateAdmissionNo
            } else if is_foreign_key_violation(&e) {
                CreateStudentError::UnknownSchool
            } else {
                CreateStudentError::Database(e)
            }
        })?;

    tracing::info!(student_id = row.id, school_id = ?row.school_id, "Student created");

    Ok(StudentDto::from_row(row, None))
}
