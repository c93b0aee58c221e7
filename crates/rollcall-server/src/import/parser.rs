//! Format detection and row extraction
//!
//! Turns an uploaded file into a grid of trimmed string cells. Row 0 is the
//! header row. Delimited text goes through the `csv` crate; Excel workbooks
//! (first sheet only) through `calamine`.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use super::models::ImportError;

/// Raw rows, header first
pub type Rows = Vec<Vec<String>>;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-delimited text
    Delimited,
    /// `.xlsx` / `.xls`
    Workbook,
}

impl FileFormat {
    /// Pick a format from the file extension, ignoring case.
    pub fn detect(file_name: &str) -> Result<Self, ImportError> {
        let lower = file_name.trim().to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(FileFormat::Delimited)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Ok(FileFormat::Workbook)
        } else {
            Err(ImportError::UnsupportedFormat(file_name.to_string()))
        }
    }
}

/// Detect the format of `file_name` and extract its rows.
///
/// Fails with [`ImportError::EmptyFile`] unless there is a header row and at
/// least one more row.
#[tracing::instrument(skip(content), fields(size = content.len()))]
pub fn extract_rows(file_name: &str, content: &[u8]) -> Result<Rows, ImportError> {
    let format = FileFormat::detect(file_name)?;

    let rows = match format {
        FileFormat::Delimited => parse_delimited(content)?,
        FileFormat::Workbook => parse_workbook(content)?,
    };

    tracing::debug!(?format, rows = rows.len(), "Extracted rows");

    if rows.len() < 2 {
        return Err(ImportError::EmptyFile);
    }

    Ok(rows)
}

fn parse_delimited(content: &[u8]) -> Result<Rows, ImportError> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Malformed(e.to_string()))?;

        // whitespace-only line
        if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
            continue;
        }

        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(rows)
}

fn parse_workbook(content: &[u8]) -> Result<Rows, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))
        .map_err(|e| ImportError::Malformed(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| ImportError::Malformed(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension_case_insensitive() {
        assert_eq!(FileFormat::detect("roster.CSV").unwrap(), FileFormat::Delimited);
        assert_eq!(FileFormat::detect("Roster.Xlsx").unwrap(), FileFormat::Workbook);
        assert_eq!(FileFormat::detect("old.xls").unwrap(), FileFormat::Workbook);
    }

    #[test]
    fn test_detect_rejects_unknown_extension() {
        assert_eq!(
            FileFormat::detect("roster.pdf"),
            Err(ImportError::UnsupportedFormat("roster.pdf".to_string()))
        );
        assert!(FileFormat::detect("csv").is_err());
    }

    #[test]
    fn test_quoted_field_keeps_delimiter() {
        let csv = "Name,Address\n\"Doe, John\",\"12, Main St\"\n";
        let rows = extract_rows("a.csv", csv.as_bytes()).unwrap();
        assert_eq!(rows[1], vec!["Doe, John", "12, Main St"]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let csv = " Name , Class \n  Jane  ,  9th \n";
        let rows = extract_rows("a.csv", csv.as_bytes()).unwrap();
        assert_eq!(rows[0], vec!["Name", "Class"]);
        assert_eq!(rows[1], vec!["Jane", "9th"]);
    }

    #[test]
    fn test_blank_and_whitespace_lines_are_ignored() {
        let csv = "Name,Class\n\nJane,9th\n   \r\nJohn,10th\n";
        let rows = extract_rows("a.csv", csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec!["John", "10th"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut content = UTF8_BOM.to_vec();
        content.extend_from_slice(b"Student Name,Class\nJane,9th\n");
        let rows = extract_rows("a.csv", &content).unwrap();
        assert_eq!(rows[0][0], "Student Name");
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let csv = "a,b,c\n1,2\n1,2,3,4\n";
        let rows = extract_rows("a.csv", csv.as_bytes()).unwrap();
        assert_eq!(rows[1].len(), 2);
        assert_eq!(rows[2].len(), 4);
    }

    #[test]
    fn test_header_only_is_empty_file() {
        assert_eq!(
            extract_rows("a.csv", b"Student Name,Class\n\n"),
            Err(ImportError::EmptyFile)
        );
        assert_eq!(extract_rows("a.csv", b""), Err(ImportError::EmptyFile));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let content = b"Name\n\xFF\xFE\xFD\n";
        assert!(matches!(
            extract_rows("a.csv", content),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn test_corrupt_workbook_is_malformed() {
        assert!(matches!(
            extract_rows("a.xlsx", b"definitely not a zip archive"),
            Err(ImportError::Malformed(_))
        ));
    }

    fn roster_workbook() -> Vec<u8> {
        use super::test_support::{xlsx, XCell::*};

        let students = vec![
            vec![
                Text("Student Name"),
                Text("Father Name"),
                Text("Mobile No"),
                Text("Address"),
                Text("Class"),
                Text("Session"),
                Text("Admission No"),
                Text("Blood Group"),
            ],
            vec![
                Text("Jane"),
                Text("Bob"),
                Number(9876543210.0),
                Blank,
                Text("9th"),
                Number(2024.0),
                Text("A1"),
                Text("O+"),
            ],
        ];
        let notes = vec![vec![Text("ignored")], vec![Text("also ignored")]];

        xlsx(&[students, notes])
    }

    #[test]
    fn test_workbook_first_sheet_rows() {
        let rows = extract_rows("Roster.XLSX", &roster_workbook()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "Student Name");
        assert_eq!(rows[0][7], "Blood Group");
        assert_eq!(
            rows[1],
            vec!["Jane", "Bob", "9876543210", "", "9th", "2024", "A1", "O+"]
        );
    }

    #[test]
    fn test_workbook_header_only_is_empty_file() {
        use super::test_support::{xlsx, XCell::*};

        let content = xlsx(&[vec![vec![Text("Student Name"), Text("Class")]]]);
        assert_eq!(extract_rows("a.xlsx", &content), Err(ImportError::EmptyFile));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("  A+ ".to_string())), "A+");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::Float(1234567890.0)), "1234567890");
    }
}
