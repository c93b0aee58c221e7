use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::validation::{hash_password, is_present, json_id, MIN_PASSWORD_LEN};

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordCommand {
    /// Number or numeric string
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing)]
    pub current_password: Option<String>,
    #[serde(default, skip_serializing)]
    pub new_password: Option<String>,
}

impl std::fmt::Debug for ChangePasswordCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordCommand")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordResponse {
    pub user_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ChangePasswordError {
    #[error("User ID, current password and new password are required")]
    MissingFields,

    #[error("New password must be at least 6 characters long")]
    TooShort,

    #[error("New password must be different from the current password")]
    Unchanged,

    #[error("User not found")]
    NotFound,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ChangePasswordResponse, ChangePasswordError>> for ChangePasswordCommand {}

impl crate::cqrs::middleware::Command for ChangePasswordCommand {}

impl ChangePasswordCommand {
    /// Checks that need no stored state. Equality with the current password
    /// is checked after the current password is verified.
    pub fn validate(&self) -> Result<(), ChangePasswordError> {
        if json_id(self.user_id.as_ref()).is_none()
            || !is_present(self.current_password.as_deref())
            || !is_present(self.new_password.as_deref())
        {
            return Err(ChangePasswordError::MissingFields);
        }

        if self.new_password.as_deref().unwrap_or_default().chars().count() < MIN_PASSWORD_LEN {
            return Err(ChangePasswordError::TooShort);
        }

        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(user_id = ?command.user_id))]
pub async fn handle(
    pool: PgPool,
    command: ChangePasswordCommand,
) -> Result<ChangePasswordResponse, ChangePasswordError> {
    command.validate()?;

    let user_id = json_id(command.user_id.as_ref()).ok_or(ChangePasswordError::MissingFields)?;
    let current = command.current_password.as_deref().unwrap_or_default();
    let new = command.new_password.as_deref().unwrap_or_default();

    let stored_hash: Option<String> =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?;
    let stored_hash = stored_hash.ok_or(ChangePasswordError::NotFound)?;

    if !stored_hash.eq_ignore_ascii_case(&hash_password(current)) {
        tracing::warn!("Password change rejected: current password mismatch");
        return Err(ChangePasswordError::WrongPassword);
    }

    if new == current {
        return Err(ChangePasswordError::Unchanged);
    }

    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(hash_password(new))
        .bind(user_id)
        .execute(&pool)
        .await?;

    tracing::info!("Password changed");

    Ok(ChangePasswordResponse { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn command(value: serde_json::Value) -> ChangePasswordCommand {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_all_fields_required() {
        let c = command(json!({"userId": 1, "currentPassword": "secret1"}));
        assert!(matches!(c.validate(), Err(ChangePasswordError::MissingFields)));

        let c = command(json!({"currentPassword": "secret1", "newPassword": "secret2"}));
        assert!(matches!(c.validate(), Err(ChangePasswordError::MissingFields)));
    }

    #[test]
    fn test_new_password_length() {
        let c = command(json!({"userId": "4", "currentPassword": "secret1", "newPassword": "abc"}));
        let err = c.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "New password must be at least 6 characters long"
        );
    }

    #[test]
    fn test_valid_command() {
        let c = command(json!({"userId": 4, "currentPassword": "secret1", "newPassword": "secret2"}));
        assert!(c.validate().is_ok());
    }
}
