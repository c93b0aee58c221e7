use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::shared::photos::signed_or_none;
use crate::storage::Storage;

/// Every column except the password hash
pub const USER_COLUMNS: &str = "id, distributor, name, email, mobile_no, address, \
     user_school_code, photo_path, photo_name, status, created_at, updated_at";

/// Status a user needs to sign in or be resolved by email
pub const ACTIVE_STATUS: &str = "Active";

/// Code given to the first account, and the base when the last code is not numeric
pub const DEFAULT_SCHOOL_CODE_BASE: u64 = 1000;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub distributor: String,
    pub name: String,
    pub email: String,
    pub mobile_no: Option<String>,
    pub address: Option<String>,
    pub user_school_code: Option<String>,
    pub photo_path: Option<String>,
    pub photo_name: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account as returned to clients. Never carries the password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub distributor: String,
    pub name: String,
    pub email: String,
    pub mobile_no: Option<String>,
    pub address: Option<String>,
    pub user_school_code: Option<String>,
    pub photo_name: Option<String>,
    pub photo_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDto {
    pub fn from_row(row: UserRow, photo_url: Option<String>) -> Self {
        Self {
            id: row.id,
            distributor: row.distributor,
            name: row.name,
            email: row.email,
            mobile_no: row.mobile_no,
            address: row.address,
            user_school_code: row.user_school_code,
            photo_name: row.photo_name,
            photo_url,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub async fn with_signed_photo(storage: &Storage, row: UserRow) -> Self {
        let photo_url = match row.photo_path.as_deref() {
            Some(key) => signed_or_none(storage, key).await,
            None => None,
        };
        Self::from_row(row, photo_url)
    }
}

/// Next school code after `previous`: its leading number plus one.
/// Missing or non-numeric codes restart from [`DEFAULT_SCHOOL_CODE_BASE`].
pub fn next_school_code(previous: Option<&str>) -> String {
    let base = previous
        .map(str::trim)
        .map(|code| {
            code.chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SCHOOL_CODE_BASE);

    (base + 1).to_string()
}

/// Trimmed optional text; blank becomes `None`
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_school_code() {
        assert_eq!(next_school_code(None), "1001");
        assert_eq!(next_school_code(Some("1005")), "1006");
        assert_eq!(next_school_code(Some("2040-North")), "2041");
        assert_eq!(next_school_code(Some("SCH-7")), "1001");
        assert_eq!(next_school_code(Some("")), "1001");
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" 98 ")).as_deref(), Some("98"));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_dto_has_no_password() {
        let now = Utc::now();
        let row = UserRow {
            id: 1,
            distributor: "North".into(),
            name: "Green Valley School".into(),
            email: "gv@example.com".into(),
            mobile_no: None,
            address: None,
            user_school_code: Some("1001".into()),
            photo_path: None,
            photo_name: None,
            status: ACTIVE_STATUS.into(),
            created_at: now,
            updated_at: now,
        };
        let body = serde_json::to_value(UserDto::from_row(row, None)).unwrap();
        assert!(body.get("password").is_none());
        assert!(body.get("passwordHash").is_none());
        assert_eq!(body["userSchoolCode"], "1001");
    }
}
