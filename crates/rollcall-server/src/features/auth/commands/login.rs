//! Login command
//!
//! Checks an email / password pair against the stored SHA-256 digest. Only
//! `Active` accounts may sign in. Every mismatch produces the same error so
//! callers cannot tell unknown emails from wrong passwords.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::validation::{hash_password, is_present, normalize_email};
use crate::features::users::types::{UserDto, UserRow, ACTIVE_STATUS, USER_COLUMNS};

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LoginCommand {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl std::fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(sqlx::FromRow)]
struct StoredCredentials {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl Request<Result<UserDto, LoginError>> for LoginCommand {}

impl crate::cqrs::middleware::Command for LoginCommand {}

impl LoginCommand {
    pub fn validate(&self) -> Result<(), LoginError> {
        if !is_present(self.email.as_deref()) || !is_present(self.password.as_deref()) {
            return Err(LoginError::MissingCredentials);
        }
        Ok(())
    }
}

/// True when the account may sign in with `password`
fn credentials_match(status: &str, stored_hash: &str, password: &str) -> bool {
    status == ACTIVE_STATUS && stored_hash.eq_ignore_ascii_case(&hash_password(password))
}

#[tracing::instrument(skip(pool, command), fields(email = ?command.email))]
pub async fn handle(pool: PgPool, command: LoginCommand) -> Result<UserDto, LoginError> {
    command.validate()?;

    let email = normalize_email(command.email.as_deref().unwrap_or_default());
    let password = command.password.as_deref().unwrap_or_default();

    let stored = sqlx::query_as::<_, StoredCredentials>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
    ))
    .bind(&email)
    .fetch_optional(&pool)
    .await?;

    match stored {
        Some(stored) if credentials_match(&stored.user.status, &stored.password_hash, password) => {
            tracing::info!(user_id = stored.user.id, "Login succeeded");
            Ok(UserDto::from_row(stored.user, None))
        },
        _ => {
            tracing::warn!("Login rejected");
            Err(LoginError::InvalidCredentials)
        },
    }
}
