use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::shared::photos::signed_or_none;
use crate::import::validation::{coerce_distributor, record_from_values};
use crate::import::{StudentField, StudentRecord};
use crate::storage::Storage;

/// Column list matching [`StudentRow`]
pub const STUDENT_COLUMNS: &str = "id, student_name, father_name, mobile_no, address, class, \
     session, admission_no, blood_group, school_id, distributor, photo_path, photo_name, \
     created_at, updated_at";

/// A row of the `students` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub student_name: String,
    pub father_name: String,
    pub mobile_no: String,
    pub address: String,
    pub class: String,
    pub session: Option<String>,
    pub admission_no: String,
    pub blood_group: String,
    pub school_id: Option<i64>,
    pub distributor: Option<String>,
    pub photo_path: Option<String>,
    pub photo_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Student as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDto {
    pub id: i64,
    pub student_name: String,
    pub father_name: String,
    pub mobile_no: String,
    pub address: String,
    pub class: String,
    pub session: Option<String>,
    pub admission_no: String,
    pub blood_group: String,
    pub school_id: Option<i64>,
    pub distributor: Option<String>,
    pub photo_name: Option<String>,
    /// Presigned download URL, present when a photo is stored
    pub photo_url: Option<String>,
    pub image_uploaded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentDto {
    pub fn from_row(row: StudentRow, photo_url: Option<String>) -> Self {
        Self {
            image_uploaded: row.photo_path.is_some(),
            id: row.id,
            student_name: row.student_name,
            father_name: row.father_name,
            mobile_no: row.mobile_no,
            address: row.address,
            class: row.class,
            session: row.session,
            admission_no: row.admission_no,
            blood_group: row.blood_group,
            school_id: row.school_id,
            distributor: row.distributor,
            photo_name: row.photo_name,
            photo_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    /// Convert `row`, presigning its photo key when it has one. A presign
    /// failure leaves `photo_url` empty.
    pub async fn with_signed_photo(storage: &Storage, row: StudentRow) -> Self {
        let photo_url = match row.photo_path.as_deref() {
            Some(key) => signed_or_none(storage, key).await,
            None => None,
        };
        Self::from_row(row, photo_url)
    }
}

/// The eight student fields as sent by clients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFields {
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub admission_no: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
}

impl StudentFields {
    fn get(&self, field: StudentField) -> Option<&str> {
        let value = match field {
            StudentField::StudentName => &self.student_name,
            StudentField::FatherName => &self.father_name,
            StudentField::MobileNo => &self.mobile_no,
            StudentField::Address => &self.address,
            StudentField::Class => &self.class,
            StudentField::Session => &self.session,
            StudentField::AdmissionNo => &self.admission_no,
            StudentField::BloodGroup => &self.blood_group,
        };
        value.as_deref()
    }

    /// Trimmed values in [`StudentField::REQUIRED`] order
    pub fn values(&self) -> [String; 8] {
        StudentField::REQUIRED.map(|f| self.get(f).unwrap_or_default().trim().to_string())
    }

    pub fn is_complete(&self) -> bool {
        self.values().iter().all(|v| !v.is_empty())
    }

    /// Build a record with the same coercions the importer applies.
    pub fn to_record(
        &self,
        school_id: Option<i64>,
        distributor: Option<&str>,
    ) -> Option<StudentRecord> {
        record_from_values(self.values(), school_id, coerce_distributor(distributor))
    }
}
