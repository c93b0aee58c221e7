//! Create user command
//!
//! Registers a school or distributor account. The password is stored as a
//! SHA-256 digest and the school code is assigned automatically when the
//! caller leaves it out.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::error_helpers::unique_violation_on;
use crate::features::shared::validation::{hash_password, is_present, normalize_email};
use crate::features::users::types::{
    next_school_code, optional_text, UserDto, UserRow, ACTIVE_STATUS, USER_COLUMNS,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserCommand {
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
    /// Assigned automatically when blank
    #[serde(default)]
    pub user_school_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("Distributor, name, email and password are required")]
    MissingFields,

    #[error("Email already exists. Please use a different email.")]
    DuplicateEmail,

    #[error("User/School code already exists. Please use a different code.")]
    DuplicateCode,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<UserDto, CreateUserError>> for CreateUserCommand {}

impl crate::cqrs::middleware::Command for CreateUserCommand {}

impl CreateUserCommand {
    pub fn validate(&self) -> Result<(), CreateUserError> {
        let required = [&self.distributor, &self.name, &self.email, &self.password];
        if !required.iter().all(|v| is_present(v.as_deref())) {
            return Err(CreateUserError::MissingFields);
        }
        Ok(())
    }
}

async fn assign_school_code(pool: &PgPool) -> Result<String, sqlx::Error> {
    let previous: Option<Option<String>> =
        sqlx::query_scalar("SELECT user_school_code FROM users ORDER BY id DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(next_school_code(previous.flatten().as_deref()))
}

#[tracing::instrument(skip(pool, command), fields(email = ?command.email))]
pub async fn handle(pool: PgPool, command: CreateUserCommand) -> Result<UserDto, CreateUserError> {
    command.validate()?;

    let email = normalize_email(command.email.as_deref().unwrap_or_default());
    let password_hash = hash_password(command.password.as_deref().unwrap_or_default());

    let code = match optional_text(command.user_school_code.as_deref()) {
        Some(code) => code,
        None => assign_school_code(&pool).await?,
    };

    let status =
        optional_text(command.status.as_deref()).unwrap_or_else(|| ACTIVE_STATUS.to_string());

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (distributor, name, email, password_hash, mobile_no, address, \
         user_school_code, status) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(optional_text(command.distributor.as_deref()))
    .bind(optional_text(command.name.as_deref()))
    .bind(&email)
    .bind(&password_hash)
    .bind(optional_text(command.mobile_no.as_deref()))
    .bind(optional_text(command.address.as_deref()))
    .bind(&code)
    .bind(&status)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if unique_violation_on(&e, "email") {
            CreateUserError::DuplicateEmail
        } else if unique_violation_on(&e, "user_school_code") {
            CreateUserError::DuplicateCode
        } else {
            CreateUserError::Database(e)
        }
    })?;

    tracing::info!(user_id = row.id, code = %code, "User created");

    Ok(UserDto::from_row(row, None))
}
