//! Import students command
//!
//! Thin command wrapper around [`crate::import::run_import`] that writes
//! into the `students` table.

use mediator::Request;
use sqlx::PgPool;

use crate::features::shared::UploadedFile;
use crate::import::{run_import, ImportError, ImportRequest, ImportResult, PgStudentSink};

#[derive(Debug, Clone)]
pub struct ImportStudentsCommand {
    pub file: Option<UploadedFile>,
    pub school_id: Option<String>,
    pub distributor: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportStudentsError {
    #[error("File is required")]
    FileRequired,

    #[error(transparent)]
    Import(#[from] ImportError),
}

impl Request<Result<ImportResult, ImportStudentsError>> for ImportStudentsCommand {}

impl crate::cqrs::middleware::Command for ImportStudentsCommand {}

impl ImportStudentsCommand {
    pub fn validate(&self) -> Result<(), ImportStudentsError> {
        match &self.file {
            Some(file) if !file.file_name.trim().is_empty() => Ok(()),
            _ => Err(ImportStudentsError::FileRequired),
        }
    }
}

#[tracing::instrument(skip(pool, command), fields(school_id = ?command.school_id))]
pub async fn handle(
    pool: PgPool,
    command: ImportStudentsCommand,
) -> Result<ImportResult, ImportStudentsError> {
    command.validate()?;

    let file = command.file.ok_or(ImportStudentsError::FileRequired)?;
    let sink = PgStudentSink::new(pool);

    let result = run_import(
        &sink,
        ImportRequest {
            file_name: file.file_name,
            content: file.data,
            school_id: command.school_id,
            distributor: command.distributor,
        },
    )
    .await?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_required() {
        let command = ImportStudentsCommand {
            file: None,
            school_id: Some("1".to_string()),
            distributor: None,
        };
        assert!(matches!(
            command.validate(),
            Err(ImportStudentsError::FileRequired)
        ));
    }

    #[test]
    fn test_blank_file_name_rejected() {
        let command = ImportStudentsCommand {
            file: Some(UploadedFile {
                file_name: " ".to_string(),
                content_type: None,
                data: b"x".to_vec(),
            }),
            school_id: None,
            distributor: None,
        };
        assert!(command.validate().is_err());
    }
}
