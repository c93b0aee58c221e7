//! Header row resolution

use super::models::{ImportError, StudentField};

/// Column index of every required field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    indices: [usize; StudentField::REQUIRED.len()],
}

impl HeaderMap {
    /// Match each required header against `header_row`, ignoring case and
    /// surrounding whitespace. Order and extra columns do not matter; the
    /// first field that cannot be found aborts the import.
    pub fn resolve(header_row: &[String]) -> Result<Self, ImportError> {
        let normalized: Vec<String> = header_row
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut indices = [0usize; StudentField::REQUIRED.len()];
        for (slot, field) in indices.iter_mut().zip(StudentField::REQUIRED) {
            let wanted = field.header().to_lowercase();
            *slot = normalized
                .iter()
                .position(|h| *h == wanted)
                .ok_or(ImportError::MissingColumn(field.header()))?;
        }

        Ok(Self { indices })
    }

    pub fn index_of(&self, field: StudentField) -> usize {
        let pos = StudentField::REQUIRED
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default();
        self.indices[pos]
    }

    /// Pairs of field and column index, in header order
    pub fn iter(&self) -> impl Iterator<Item = (StudentField, usize)> + '_ {
        StudentField::REQUIRED.into_iter().zip(self.indices.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    const CANONICAL: [&str; 8] = [
        "Student Name",
        "Father Name",
        "Mobile No",
        "Address",
        "Class",
        "Session",
        "Admission No",
        "Blood Group",
    ];

    #[test]
    fn test_canonical_order() {
        let map = HeaderMap::resolve(&header(&CANONICAL)).unwrap();
        for (i, (field, idx)) in map.iter().enumerate() {
            assert_eq!(idx, i, "{:?}", field);
        }
    }

    #[test]
    fn test_case_insensitive_and_reordered() {
        let map = HeaderMap::resolve(&header(&[
            "BLOOD GROUP",
            "  student name ",
            "Notes",
            "father name",
            "mobile no",
            "ADDRESS",
            "class",
            "Session",
            "admission NO",
        ]))
        .unwrap();
        assert_eq!(map.index_of(StudentField::BloodGroup), 0);
        assert_eq!(map.index_of(StudentField::StudentName), 1);
        assert_eq!(map.index_of(StudentField::FatherName), 3);
        assert_eq!(map.index_of(StudentField::AdmissionNo), 8);
    }

    #[test]
    fn test_each_missing_column_is_reported() {
        for skip in 0..CANONICAL.len() {
            let cells: Vec<&str> = CANONICAL
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, c)| *c)
                .collect();
            assert_eq!(
                HeaderMap::resolve(&header(&cells)),
                Err(ImportError::MissingColumn(CANONICAL[skip]))
            );
        }
    }

    #[test]
    fn test_first_missing_column_wins() {
        let err = HeaderMap::resolve(&header(&["Class", "Session"])).unwrap_err();
        assert_eq!(err, ImportError::MissingColumn("Student Name"));
    }

    #[test]
    fn test_partial_name_does_not_match() {
        let mut cells = CANONICAL.to_vec();
        cells[0] = "Student Name (full)";
        assert!(HeaderMap::resolve(&header(&cells)).is_err());
    }
}
