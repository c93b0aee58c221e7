//! Row validation and normalisation

use chrono::Utc;

use super::mapping::HeaderMap;
use super::models::{ImportError, StudentField, StudentRecord};

/// `schoolId` must be a positive integer; anything else is dropped.
pub fn coerce_school_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

/// Blank distributor labels are stored as NULL.
pub fn coerce_distributor(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build a record from the eight values in [`StudentField::REQUIRED`] order.
/// Returns `None` when any value is blank.
pub fn record_from_values(
    values: [String; 8],
    school_id: Option<i64>,
    distributor: Option<String>,
) -> Option<StudentRecord> {
    if values.iter().any(|v| v.is_empty()) {
        return None;
    }

    let [student_name, father_name, mobile_no, address, class, session, admission_no, blood_group] =
        values;

    Some(StudentRecord {
        student_name,
        father_name,
        mobile_no,
        address,
        class,
        session,
        admission_no,
        blood_group,
        school_id,
        distributor,
        created_at: Utc::now(),
    })
}

/// Convert data rows (header excluded) into records.
///
/// Rows with fewer cells than required fields, all-blank rows and rows with
/// any blank required value are skipped silently.
pub fn build_records(
    data_rows: &[Vec<String>],
    headers: &HeaderMap,
    school_id: Option<i64>,
    distributor: Option<&str>,
) -> Result<Vec<StudentRecord>, ImportError> {
    let distributor = coerce_distributor(distributor);
    let mut records = Vec::with_capacity(data_rows.len());
    let mut skipped = 0usize;

    for row in data_rows {
        if row.len() < StudentField::REQUIRED.len() {
            skipped += 1;
            continue;
        }

        let values: [String; 8] = std::array::from_fn(|i| {
            let idx = headers.index_of(StudentField::REQUIRED[i]);
            row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default()
        });

        if values.iter().all(|v| v.is_empty()) {
            continue;
        }

        match record_from_values(values, school_id, distributor.clone()) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    tracing::debug!(valid = records.len(), skipped, "Validated rows");

    if records.is_empty() {
        return Err(ImportError::NoValidRows);
    }

    Ok(records)
}
