//! Data types flowing through the student import pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The eight student columns every import file must carry.
///
/// Each field knows its spreadsheet header, its `students` column and its
/// camelCase API name. The mapping is total and fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentField {
    StudentName,
    FatherName,
    MobileNo,
    Address,
    Class,
    Session,
    AdmissionNo,
    BloodGroup,
}

impl StudentField {
    /// All required fields in header order
    pub const REQUIRED: [StudentField; 8] = [
        StudentField::StudentName,
        StudentField::FatherName,
        StudentField::MobileNo,
        StudentField::Address,
        StudentField::Class,
        StudentField::Session,
        StudentField::AdmissionNo,
        StudentField::BloodGroup,
    ];

    /// Column title in import files and exports
    pub fn header(self) -> &'static str {
        match self {
            StudentField::StudentName => "Student Name",
            StudentField::FatherName => "Father Name",
            StudentField::MobileNo => "Mobile No",
            StudentField::Address => "Address",
            StudentField::Class => "Class",
            StudentField::Session => "Session",
            StudentField::AdmissionNo => "Admission No",
            StudentField::BloodGroup => "Blood Group",
        }
    }

    /// Column in the `students` table
    pub fn column(self) -> &'static str {
        match self {
            StudentField::StudentName => "student_name",
            StudentField::FatherName => "father_name",
            StudentField::MobileNo => "mobile_no",
            StudentField::Address => "address",
            StudentField::Class => "class",
            StudentField::Session => "session",
            StudentField::AdmissionNo => "admission_no",
            StudentField::BloodGroup => "blood_group",
        }
    }

    /// Key in JSON request and response bodies
    pub fn api_name(self) -> &'static str {
        match self {
            StudentField::StudentName => "studentName",
            StudentField::FatherName => "fatherName",
            StudentField::MobileNo => "mobileNo",
            StudentField::Address => "address",
            StudentField::Class => "class",
            StudentField::Session => "session",
            StudentField::AdmissionNo => "admissionNo",
            StudentField::BloodGroup => "bloodGroup",
        }
    }
}

/// A validated student ready for insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub student_name: String,
    pub father_name: String,
    pub mobile_no: String,
    pub address: String,
    pub class: String,
    pub session: String,
    pub admission_no: String,
    pub blood_group: String,
    pub school_id: Option<i64>,
    pub distributor: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StudentRecord {
    pub fn value(&self, field: StudentField) -> &str {
        match field {
            StudentField::StudentName => &self.student_name,
            StudentField::FatherName => &self.father_name,
            StudentField::MobileNo => &self.mobile_no,
            StudentField::Address => &self.address,
            StudentField::Class => &self.class,
            StudentField::Session => &self.session,
            StudentField::AdmissionNo => &self.admission_no,
            StudentField::BloodGroup => &self.blood_group,
        }
    }
}

/// An uploaded file plus the tenant context it is imported under
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file_name: String,
    pub content: Vec<u8>,
    /// Raw form value; coerced to a positive integer or dropped
    pub school_id: Option<String>,
    /// Raw form value; blank becomes `None`
    pub distributor: Option<String>,
}

/// Outcome of a completed import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// Rows the store confirmed as inserted
    pub imported: u64,
    /// Validated rows that were attempted
    pub total: usize,
    /// One message per failed chunk
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ImportResult {
    /// Every chunk failed and nothing was stored
    pub fn is_total_failure(&self) -> bool {
        self.imported == 0 && !self.errors.is_empty()
    }
}

/// Precondition failures. All of them abort the import before any insert.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Unsupported file format: '{0}'. Please upload a CSV or Excel file (.csv, .xlsx, .xls)")]
    UnsupportedFormat(String),

    #[error("File must have at least a header row and one data row")]
    EmptyFile,

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("No valid student data found in file")]
    NoValidRows,

    #[error("Could not read file: {0}")]
    Malformed(String),
}
