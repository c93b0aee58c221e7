//! CSV export of a school's students
//!
//! One row per student in list order, with a running serial number and the
//! presigned photo URL when a photo exists.

use chrono::{NaiveDate, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::photos::signed_or_none;
use crate::features::students::scope::{fetch_students, ScopeError, StudentFilter};
use crate::features::students::types::StudentRow;
use crate::storage::Storage;

pub const EXPORT_HEADER: [&str; 12] = [
    "Sr No",
    "Student Name",
    "Father Name",
    "Mobile No",
    "Address",
    "Class",
    "Session",
    "Admission No",
    "Blood Group",
    "Card Batch",
    "Photo URL",
    "Created At",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportStudentsQuery {
    #[serde(flatten)]
    pub filter: StudentFilter,
}

/// A rendered CSV ready to send as an attachment
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportStudentsError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("No students found to export")]
    NoStudents,
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write CSV: {0}")]
    Buffer(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ExportedFile, ExportStudentsError>> for ExportStudentsQuery {}

impl crate::cqrs::middleware::Query for ExportStudentsQuery {}

impl ExportStudentsQuery {
    pub fn validate(&self) -> Result<(), ExportStudentsError> {
        Ok(self.filter.validate()?)
    }
}

/// `students_batch_{batch|all}_{YYYY-MM-DD}.csv`
pub fn export_file_name(batch_label: &str, date: NaiveDate) -> String {
    format!("students_batch_{}_{}.csv", batch_label, date.format("%Y-%m-%d"))
}

/// Render rows paired with their optional photo URL.
pub fn render_csv(rows: &[(StudentRow, Option<String>)]) -> Result<Vec<u8>, ExportStudentsError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for (index, (row, photo_url)) in rows.iter().enumerate() {
        let session = row.session.as_deref().unwrap_or_default();
        writer.write_record([
            (index + 1).to_string().as_str(),
            &row.student_name,
            &row.father_name,
            &row.mobile_no,
            &row.address,
            &row.class,
            session,
            &row.admission_no,
            &row.blood_group,
            session,
            photo_url.as_deref().unwrap_or_default(),
            &row.created_at.to_rfc3339(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportStudentsError::Buffer(e.error().to_string()))
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    query: ExportStudentsQuery,
) -> Result<ExportedFile, ExportStudentsError> {
    query.validate()?;

    let scope = query.filter.resolve(&pool).await?;
    let rows = fetch_students(&pool, &scope, false).await?;
    if rows.is_empty() {
        return Err(ExportStudentsError::NoStudents);
    }

    let mut with_urls = Vec::with_capacity(rows.len());
    for row in rows {
        let url = match row.photo_path.as_deref() {
            Some(key) => signed_or_none(&storage, key).await,
            None => None,
        };
        with_urls.push((row, url));
    }

    let content = render_csv(&with_urls)?;
    let file_name = export_file_name(scope.batch_label(), Utc::now().date_naive());

    tracing::info!(rows = with_urls.len(), file_name = %file_name, "Exported students");

    Ok(ExportedFile { file_name, content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(id: i64, name: &str, session: Option<&str>) -> StudentRow {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        StudentRow {
            id,
            student_name: name.to_string(),
            father_name: "Ravi".to_string(),
            mobile_no: "9876543210".to_string(),
            address: "12 Park Road, Pune".to_string(),
            class: "5".to_string(),
            session: session.map(str::to_string),
            admission_no: format!("A-{id}"),
            blood_group: "O+".to_string(),
            school_id: Some(1),
            distributor: None,
            photo_path: None,
            photo_name: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name("all", date), "students_batch_all_2024-03-09.csv");
        assert_eq!(
            export_file_name("2024-25", date),
            "students_batch_2024-25_2024-03-09.csv"
        );
    }

    #[test]
    fn test_render_csv() {
        let rows = vec![
            (row(1, "Asha", Some("2024-25")), Some("https://signed/1".to_string())),
            (row(2, "Vikram", None), None),
        ];

        let text = String::from_utf8(render_csv(&rows).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Sr No,Student Name,Father Name,Mobile No,Address,Class,Session,Admission No,Blood Group,Card Batch,Photo URL,Created At"
        );
        assert_eq!(
            lines[1],
            "1,Asha,Ravi,9876543210,\"12 Park Road, Pune\",5,2024-25,A-1,O+,2024-25,https://signed/1,2024-06-01T08:30:00+00:00"
        );
        assert!(lines[2].starts_with("2,Vikram,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_validate_requires_scope() {
        assert!(matches!(
            ExportStudentsQuery::default().validate(),
            Err(ExportStudentsError::Scope(ScopeError::Missing))
        ));
    }
}
