//! End-to-end import: file bytes in, [`ImportResult`] out

use super::{
    mapping::HeaderMap,
    models::{ImportError, ImportRequest, ImportResult},
    parser::extract_rows,
    storage::{persist_in_chunks, StudentSink},
    validation::{build_records, coerce_school_id},
};

/// Parse, map, validate and persist one uploaded file.
///
/// Precondition failures return `Err` before anything is written. Once
/// persistence starts the call always completes with an [`ImportResult`].
#[tracing::instrument(
    skip(sink, request),
    fields(file_name = %request.file_name, size = request.content.len())
)]
pub async fn run_import(
    sink: &dyn StudentSink,
    request: ImportRequest,
) -> Result<ImportResult, ImportError> {
    let rows = extract_rows(&request.file_name, &request.content)?;
    let (header, data_rows) = rows.split_first().ok_or(ImportError::EmptyFile)?;

    let headers = HeaderMap::resolve(header)?;

    let school_id = coerce_school_id(request.school_id.as_deref());
    let records = build_records(data_rows, &headers, school_id, request.distributor.as_deref())?;

    tracing::info!(total = records.len(), ?school_id, "Importing students");

    let result = persist_in_chunks(sink, &records).await;

    tracing::info!(
        imported = result.imported,
        total = result.total,
        failed_chunks = result.errors.len(),
        "Import finished"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{sample::sample_csv, storage::test_support::RecordingSink};

    const HEADER: &str =
        "Student Name,Father Name,Mobile No,Address,Class,Session,Admission No,Blood Group";

    fn request(file_name: &str, content: String) -> ImportRequest {
        ImportRequest {
            file_name: file_name.to_string(),
            content: content.into_bytes(),
            school_id: Some("42".to_string()),
            distributor: Some("Acme Distributors".to_string()),
        }
    }

    fn csv_with_rows(n: usize) -> String {
        let mut out = String::from(HEADER);
        for i in 0..n {
            out.push_str(&format!(
                "\nStudent {i},Father {i},98765{i:05},\"{i} Long Road, Town\",5th,2024-2025,ADM{i:05},O+"
            ));
        }
        out
    }

    #[tokio::test]
    async fn test_workbook_with_blank_cell_is_skipped() {
        use crate::import::parser::test_support::{xlsx, XCell::*};

        let header: Vec<_> = HEADER.split(',').map(Text).collect();
        let complete = vec![
            Text("Jane"),
            Text("Bob"),
            Number(9876543210.0),
            Text("4 Park Lane"),
            Text("9th"),
            Text("2024-2025"),
            Text("A1"),
            Text("O+"),
        ];
        let mut missing_address = complete.clone();
        missing_address[3] = Blank;
        missing_address[6] = Text("A2");

        let sink = RecordingSink::default();
        let result = run_import(
            &sink,
            ImportRequest {
                file_name: "students.xlsx".to_string(),
                content: xlsx(&[vec![header, complete, missing_address]]),
                school_id: Some("42".to_string()),
                distributor: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.imported, 1);
        assert_eq!(sink.sizes(), vec![1]);
    }

    #[tokio::test]
    async fn test_two_line_csv_with_blank_line() {
        let content = format!(
            "{HEADER}\nJohn Doe,Robert Doe,1234567890,123 Main St,10th,2024-2025,ADM001,A+\n\n"
        );
        let sink = RecordingSink::default();
        let result = run_import(&sink, request("students.csv", content)).await.unwrap();
        assert_eq!(
            result,
            ImportResult {
                imported: 1,
                total: 1,
                errors: vec![]
            }
        );
    }

    #[tokio::test]
    async fn test_missing_column_inserts_nothing() {
        let content = "Student Name,Father Name,Mobile No,Address,Class,Session,Blood Group\n\
                       John,Rob,1,2,3,4,5"
            .to_string();
        let sink = RecordingSink::default();
        let err = run_import(&sink, request("students.csv", content)).await.unwrap_err();
        assert_eq!(err, ImportError::MissingColumn("Admission No"));
        assert!(sink.sizes().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let sink = RecordingSink::default();
        let err = run_import(&sink, request("students.txt", csv_with_rows(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_blank_rows_do_not_count() {
        let content = format!("{}\n,,,,,,,\n , , , , , , , \n", csv_with_rows(3));
        let sink = RecordingSink::default();
        let result = run_import(&sink, request("students.csv", content)).await.unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.imported, 3);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_only_blank_rows_is_no_valid_rows() {
        let content = format!("{HEADER}\n,,,,,,,\n");
        let sink = RecordingSink::default();
        let err = run_import(&sink, request("students.csv", content)).await.unwrap_err();
        assert_eq!(err, ImportError::NoValidRows);
    }

    #[tokio::test]
    async fn test_chunking_through_pipeline() {
        let sink = RecordingSink::failing(&[2]);
        let result = run_import(&sink, request("big.CSV", csv_with_rows(101)))
            .await
            .unwrap();
        assert_eq!(sink.sizes(), vec![100, 1]);
        assert_eq!(result.imported, 100);
        assert_eq!(result.total, 101);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_sample_file_imports_two_students() {
        let sink = RecordingSink::default();
        let result = run_import(&sink, request("sample_students.csv", sample_csv()))
            .await
            .unwrap();
        assert_eq!(result.imported, 2);
    }
}
