use chrono::Utc;
use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::storage::{extension_of, Storage};

/// Extensions accepted for batch files
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["xls", "xlsx", "csv", "zip"];

/// Content types accepted when the name carries no usable extension
const ALLOWED_CONTENT_TYPES: [(&str, &str); 6] = [
    ("application/vnd.ms-excel", "xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("text/csv", "csv"),
    ("application/zip", "zip"),
    ("application/x-zip-compressed", "zip"),
    ("application/csv", "csv"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileCommand {
    pub file_name: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    /// Stored name, unique per upload
    pub file_name: String,
    pub key: String,
    pub size: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadFileError {
    #[error("File is required")]
    FileRequired,
    #[error("Filename must not exceed 255 characters")]
    FilenameLength,
    #[error("Only Excel (.xls, .xlsx), CSV and ZIP files are allowed")]
    UnsupportedType,
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl Request<Result<UploadFileResponse, UploadFileError>> for UploadFileCommand {}

impl crate::cqrs::middleware::Command for UploadFileCommand {}

impl UploadFileCommand {
    pub fn validate(&self) -> Result<(), UploadFileError> {
        if self.file_name.trim().is_empty() || self.content.is_empty() {
            return Err(UploadFileError::FileRequired);
        }
        if self.file_name.len() > 255 {
            return Err(UploadFileError::FilenameLength);
        }
        self.extension().map(|_| ())
    }

    /// Extension from the name when allowed, else from the content type
    fn extension(&self) -> Result<String, UploadFileError> {
        if let Some(ext) = extension_of(base_name(&self.file_name)) {
            if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
                return Ok(ext);
            }
        }

        let content_type = self
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());

        content_type
            .and_then(|ct| {
                ALLOWED_CONTENT_TYPES
                    .iter()
                    .find(|(allowed, _)| *allowed == ct)
                    .map(|(_, ext)| ext.to_string())
            })
            .ok_or(UploadFileError::UnsupportedType)
    }
}

/// Last path segment of a client-supplied name
fn base_name(file_name: &str) -> &str {
    file_name
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
}

/// `{stem}-{millis}.{ext}`
pub fn stored_file_name(file_name: &str, ext: &str, millis: i64) -> String {
    let base = base_name(file_name);
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };
    let stem: String = stem
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    let stem = if stem.is_empty() || stem.starts_with('.') {
        format!("file{stem}")
    } else {
        stem
    };
    format!("{stem}-{millis}.{ext}")
}

#[tracing::instrument(skip(storage, command), fields(file_name = %command.file_name, size = command.content.len()))]
pub async fn handle(
    storage: Storage,
    command: UploadFileCommand,
) -> Result<UploadFileResponse, UploadFileError> {
    command.validate()?;

    let ext = command.extension()?;
    let file_name = stored_file_name(&command.file_name, &ext, Utc::now().timestamp_millis());
    let key = storage.batch_file_key(&file_name);

    let upload_result = storage
        .upload(&key, command.content, command.content_type)
        .await?;

    Ok(UploadFileResponse {
        file_name,
        key: upload_result.key,
        size: upload_result.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(file_name: &str, content_type: Option<&str>) -> UploadFileCommand {
        UploadFileCommand {
            file_name: file_name.to_string(),
            content: vec![1, 2, 3],
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn test_accepts_allowed_extensions() {
        for name in ["a.xls", "b.XLSX", "c.csv", "d.zip"] {
            assert!(command(name, None).validate().is_ok(), "{name}");
        }
    }

    #[test]
    fn test_rejects_other_types() {
        assert!(matches!(
            command("notes.pdf", Some("application/pdf")).validate(),
            Err(UploadFileError::UnsupportedType)
        ));
    }

    #[test]
    fn test_content_type_fallback() {
        let cmd = command("roster", Some("text/csv; charset=utf-8"));
        assert_eq!(cmd.extension().unwrap(), "csv");
    }

    #[test]
    fn test_empty_content_rejected() {
        let mut cmd = command("a.csv", None);
        cmd.content.clear();
        assert!(matches!(cmd.validate(), Err(UploadFileError::FileRequired)));
    }

    #[test]
    fn test_filename_too_long() {
        let name = format!("{}.csv", "a".repeat(256));
        assert!(matches!(
            command(&name, None).validate(),
            Err(UploadFileError::FilenameLength)
        ));
    }

    #[test]
    fn test_stored_file_name() {
        assert_eq!(
            stored_file_name("Class 5 Roster.xlsx", "xlsx", 1700000000000),
            "Class_5_Roster-1700000000000.xlsx"
        );
        assert_eq!(
            stored_file_name("C:\\exports\\batch.csv", "csv", 1),
            "batch-1.csv"
        );
        assert_eq!(stored_file_name("roster", "csv", 2), "roster-2.csv");
    }
}
