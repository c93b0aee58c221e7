use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::error_helpers::unique_violation_on;
use crate::features::shared::validation::{hash_password, is_present, normalize_email};
use crate::features::users::types::{optional_text, UserDto, UserRow, USER_COLUMNS};
use crate::storage::Storage;

/// Update an account. The password changes only when one is sent; school
/// code and status keep their stored values when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserCommand {
    #[serde(skip)]
    pub id: i64,
    #[serde(default)]
    pub distributor: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub user_school_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateUserError {
    #[error("Invalid user ID")]
    InvalidId,

    #[error("Distributor, name and email are required")]
    MissingFields,

    #[error("User not found")]
    NotFound,

    #[error("Email already exists. Please use a different email.")]
    DuplicateEmail,

    #[error("User/School code already exists. Please use a different code.")]
    DuplicateCode,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<UserDto, UpdateUserError>> for UpdateUserCommand {}

impl crate::cqrs::middleware::Command for UpdateUserCommand {}

impl UpdateUserCommand {
    pub fn validate(&self) -> Result<(), UpdateUserError> {
        if self.id <= 0 {
            return Err(UpdateUserError::InvalidId);
        }
        let required = [&self.distributor, &self.name, &self.email];
        if !required.iter().all(|v| is_present(v.as_deref())) {
            return Err(UpdateUserError::MissingFields);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, storage, command), fields(user_id = command.id))]
pub async fn handle(
    pool: PgPool,
    storage: Storage,
    command: UpdateUserCommand,
) -> Result<UserDto, UpdateUserError> {
    command.validate()?;

    let password_hash = command
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(hash_password);

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET distributor = $1, name = $2, email = $3, mobile_no = $4, address = $5, \
         user_school_code = COALESCE($6, user_school_code), status = COALESCE($7, status), \
         password_hash = COALESCE($8, password_hash), updated_at = NOW() \
         WHERE id = $9 RETURNING {USER_COLUMNS}"
    ))
    .bind(optional_text(command.distributor.as_deref()))
    .bind(optional_text(command.name.as_deref()))
    .bind(normalize_email(command.email.as_deref().unwrap_or_default()))
    .bind(optional_text(command.mobile_no.as_deref()))
    .bind(optional_text(command.address.as_deref()))
    .bind(optional_text(command.user_school_code.as_deref()))
    .bind(optional_text(command.status.as_deref()))
    .bind(password_hash)
    .bind(command.id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        if unique_violation_on(&e, "email") {
            UpdateUserError::DuplicateEmail
        } else if unique_violation_on(&e, "user_school_code") {
            UpdateUserError::DuplicateCode
        } else {
            UpdateUserError::Database(e)
        }
    })?
    .ok_or(UpdateUserError::NotFound)?;

    tracing::info!("User updated");

    Ok(UserDto::with_signed_photo(&storage, row).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> UpdateUserCommand {
        UpdateUserCommand {
            id: 3,
            distributor: Some("North".to_string()),
            name: Some("Green Valley".to_string()),
            email: Some("gv@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_password_is_optional() {
        assert!(command().validate().is_ok());
    }

    #[test]
    fn test_requires_name() {
        let mut c = command();
        c.name = None;
        assert!(matches!(c.validate(), Err(UpdateUserError::MissingFields)));
    }

    #[test]
    fn test_requires_id() {
        let mut c = command();
        c.id = 0;
        assert!(matches!(c.validate(), Err(UpdateUserError::InvalidId)));
    }
}
