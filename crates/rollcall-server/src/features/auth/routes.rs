//! Auth API routes
//!
//! - `POST /api/v1/auth/login` - Check credentials, returns the account
//! - `POST /api/v1/auth/change-password` - Replace a password

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::commands::{ChangePasswordCommand, ChangePasswordError, LoginCommand, LoginError};
use crate::api::response::{internal_error, not_found, validation_error, ErrorResponse};
use crate::features::FeatureState;

pub fn auth_routes() -> Router<FeatureState> {
    Router::new()
        .route("/login", post(login))
        .route("/change-password", post(change_password))
}

#[tracing::instrument(skip(pool, command))]
async fn login(
    State(pool): State<PgPool>,
    Json(command): Json<LoginCommand>,
) -> Result<Response, AuthApiError> {
    let user = super::commands::login::handle(pool, command).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": user,
    }))
    .into_response())
}

#[tracing::instrument(skip(pool, command))]
async fn change_password(
    State(pool): State<PgPool>,
    Json(command): Json<ChangePasswordCommand>,
) -> Result<Response, AuthApiError> {
    super::commands::change_password::handle(pool, command).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully",
    }))
    .into_response())
}

#[derive(Debug)]
enum AuthApiError {
    Login(LoginError),
    ChangePassword(ChangePasswordError),
}

impl From<LoginError> for AuthApiError {
    fn from(err: LoginError) -> Self {
        Self::Login(err)
    }
}

impl From<ChangePasswordError> for AuthApiError {
    fn from(err: ChangePasswordError) -> Self {
        Self::ChangePassword(err)
    }
}

fn unauthorized(message: String) -> Response {
    ErrorResponse::new("UNAUTHORIZED", message).into_response_with(StatusCode::UNAUTHORIZED)
}

fn database_error(err: &sqlx::Error) -> Response {
    tracing::error!(error = %err, "Auth query failed");
    internal_error("DATABASE_ERROR", "Database operation failed")
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        match self {
            AuthApiError::Login(e @ LoginError::MissingCredentials) => {
                validation_error(e.to_string())
            },
            AuthApiError::Login(e @ LoginError::InvalidCredentials) => unauthorized(e.to_string()),
            AuthApiError::Login(LoginError::Database(e)) => database_error(&e),

            AuthApiError::ChangePassword(e @ ChangePasswordError::MissingFields)
            | AuthApiError::ChangePassword(e @ ChangePasswordError::TooShort)
            | AuthApiError::ChangePassword(e @ ChangePasswordError::Unchanged) => {
                validation_error(e.to_string())
            },
            AuthApiError::ChangePassword(e @ ChangePasswordError::NotFound) => {
                not_found(e.to_string())
            },
            AuthApiError::ChangePassword(e @ ChangePasswordError::WrongPassword) => {
                unauthorized(e.to_string())
            },
            AuthApiError::ChangePassword(ChangePasswordError::Database(e)) => database_error(&e),
        }
    }
}
