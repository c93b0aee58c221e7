//! Downloadable template for student imports

use super::models::StudentField;

pub const SAMPLE_FILE_NAME: &str = "sample_students.csv";

pub const SAMPLE_CONTENT_TYPE: &str = "text/csv";

const SAMPLE_ROWS: [[&str; 8]; 2] = [
    [
        "John Doe",
        "Robert Doe",
        "1234567890",
        "123 Main St",
        "10th",
        "2024-2025",
        "ADM001",
        "A+",
    ],
    [
        "Jane Smith",
        "Michael Smith",
        "0987654321",
        "456 Oak Ave",
        "9th",
        "2024-2025",
        "ADM002",
        "B+",
    ],
];

/// Header row plus two example students, newline separated without a
/// trailing newline.
pub fn sample_csv() -> String {
    let header = StudentField::REQUIRED
        .iter()
        .map(|f| f.header())
        .collect::<Vec<_>>()
        .join(",");

    std::iter::once(header)
        .chain(SAMPLE_ROWS.iter().map(|row| row.join(",")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{mapping::HeaderMap, parser::extract_rows};

    #[test]
    fn test_sample_content() {
        let expected = "Student Name,Father Name,Mobile No,Address,Class,Session,Admission No,Blood Group\n\
                        John Doe,Robert Doe,1234567890,123 Main St,10th,2024-2025,ADM001,A+\n\
                        Jane Smith,Michael Smith,0987654321,456 Oak Ave,9th,2024-2025,ADM002,B+";
        assert_eq!(sample_csv(), expected);
    }

    #[test]
    fn test_sample_is_importable() {
        let rows = extract_rows(SAMPLE_FILE_NAME, sample_csv().as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(HeaderMap::resolve(&rows[0]).is_ok());
    }
}
