//! User (school / distributor account) API routes
//!
//! - `GET /api/v1/users` - List accounts
//! - `POST /api/v1/users` - Create an account
//! - `GET /api/v1/users/count` - Number of accounts
//! - `POST /api/v1/users/upload-photo` - Attach a photo (multipart)
//! - `GET|PUT|DELETE /api/v1/users/:id`

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::{
    commands::{
        CreateUserCommand, CreateUserError, DeleteUserCommand, DeleteUserError,
        UpdateUserCommand, UpdateUserError, UploadUserPhotoCommand, UploadUserPhotoError,
    },
    queries::{
        CountUsersError, CountUsersQuery, GetUserError, GetUserQuery, ListUsersError,
        ListUsersQuery,
    },
};
use crate::api::response::{internal_error, not_found, validation_error, ApiResponse, ErrorResponse};
use crate::features::shared::photos::PhotoUploadError;
use crate::features::shared::validation::parse_id;
use crate::features::shared::MultipartForm;
use crate::features::FeatureState;
use crate::storage::Storage;

pub fn users_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/count", get(count_users))
        .route("/upload-photo", post(upload_photo))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

fn user_id(raw: &str) -> Result<i64, UserApiError> {
    parse_id(raw).ok_or(UserApiError::InvalidId)
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

#[tracing::instrument(skip(pool, command))]
async fn create_user(
    State(pool): State<PgPool>,
    Json(command): Json<CreateUserCommand>,
) -> Result<Response, UserApiError> {
    let user = super::commands::create::handle(pool, command).await?;

    tracing::info!(user_id = user.id, "User created via API");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user).with_message("User created successfully")),
    )
        .into_response())
}

#[tracing::instrument(skip(pool, storage, command))]
async fn update_user(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Path(id): Path<String>,
    Json(mut command): Json<UpdateUserCommand>,
) -> Result<Response, UserApiError> {
    command.id = user_id(&id)?;

    let user = super::commands::update::handle(pool, storage, command).await?;

    Ok(ApiResponse::success(user)
        .with_message("User updated successfully")
        .into_response())
}

#[tracing::instrument(skip(pool, storage))]
async fn delete_user(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Path(id): Path<String>,
) -> Result<Response, UserApiError> {
    let command = DeleteUserCommand { id: user_id(&id)? };

    let response = super::commands::delete::handle(pool, storage, command).await?;

    Ok(ApiResponse::success(response)
        .with_message("User deleted successfully")
        .into_response())
}

#[tracing::instrument(skip(pool, storage, multipart))]
async fn upload_photo(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    multipart: Multipart,
) -> Result<Response, UserApiError> {
    let mut form = MultipartForm::read(multipart).await?;

    let command = UploadUserPhotoCommand {
        user_id: form.text("userId").and_then(parse_id),
        photo: form.take_file(&["photo"]),
    };

    let response = super::commands::upload_photo::handle(pool, storage, command).await?;

    Ok(ApiResponse::success(response)
        .with_message("Photo uploaded successfully")
        .into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(pool, storage))]
async fn list_users(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
) -> Result<Response, UserApiError> {
    let users = super::queries::list::handle(pool, storage, ListUsersQuery::default()).await?;

    Ok(ApiResponse::list(users).into_response())
}

#[tracing::instrument(skip(pool))]
async fn count_users(State(pool): State<PgPool>) -> Result<Response, UserApiError> {
    let response = super::queries::count::handle(pool, CountUsersQuery::default()).await?;

    Ok(Json(json!({ "success": true, "count": response.count })).into_response())
}

#[tracing::instrument(skip(pool, storage))]
async fn get_user(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Path(id): Path<String>,
) -> Result<Response, UserApiError> {
    let query = GetUserQuery { id: user_id(&id)? };

    let user = super::queries::get::handle(pool, storage, query).await?;

    Ok(ApiResponse::success(user).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum UserApiError {
    InvalidId,
    Multipart(MultipartError),
    Create(CreateUserError),
    Update(UpdateUserError),
    Delete(DeleteUserError),
    Photo(UploadUserPhotoError),
    List(ListUsersError),
    Count(CountUsersError),
    Get(GetUserError),
}

impl From<MultipartError> for UserApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<CreateUserError> for UserApiError {
    fn from(err: CreateUserError) -> Self {
        Self::Create(err)
    }
}

impl From<UpdateUserError> for UserApiError {
    fn from(err: UpdateUserError) -> Self {
        Self::Update(err)
    }
}

impl From<DeleteUserError> for UserApiError {
    fn from(err: DeleteUserError) -> Self {
        Self::Delete(err)
    }
}

impl From<UploadUserPhotoError> for UserApiError {
    fn from(err: UploadUserPhotoError) -> Self {
        Self::Photo(err)
    }
}

impl From<ListUsersError> for UserApiError {
    fn from(err: ListUsersError) -> Self {
        Self::List(err)
    }
}

impl From<CountUsersError> for UserApiError {
    fn from(err: CountUsersError) -> Self {
        Self::Count(err)
    }
}

impl From<GetUserError> for UserApiError {
    fn from(err: GetUserError) -> Self {
        Self::Get(err)
    }
}

fn database_error(err: &sqlx::Error) -> Response {
    tracing::error!(error = %err, "User query failed");
    internal_error("DATABASE_ERROR", "Database operation failed")
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        match self {
            UserApiError::InvalidId => validation_error("Invalid user ID"),
            UserApiError::Multipart(e) => ErrorResponse::new("INVALID_MULTIPART", e.body_text())
                .into_response_with(StatusCode::BAD_REQUEST),

            UserApiError::Create(CreateUserError::Database(e)) => database_error(&e),
            UserApiError::Create(e) => validation_error(e.to_string()),

            UserApiError::Update(e @ UpdateUserError::NotFound) => not_found(e.to_string()),
            UserApiError::Update(UpdateUserError::Database(e)) => database_error(&e),
            UserApiError::Update(e) => validation_error(e.to_string()),

            UserApiError::Delete(e @ DeleteUserError::InvalidId) => validation_error(e.to_string()),
            UserApiError::Delete(e @ DeleteUserError::NotFound) => not_found(e.to_string()),
            UserApiError::Delete(DeleteUserError::Database(e)) => database_error(&e),

            UserApiError::Photo(e @ PhotoUploadError::MissingInput(_))
            | UserApiError::Photo(e @ PhotoUploadError::Image(_)) => {
                validation_error(e.to_string())
            },
            UserApiError::Photo(e @ PhotoUploadError::NotFound(_)) => not_found(e.to_string()),
            UserApiError::Photo(PhotoUploadError::Upload(e)) => {
                tracing::error!(error = %format!("{e:#}"), "User photo upload failed");
                internal_error("STORAGE_ERROR", "Failed to upload photo")
            },
            UserApiError::Photo(PhotoUploadError::Database(e)) => {
                tracing::error!(error = %e, "User photo row update failed");
                internal_error("DATABASE_ERROR", "Failed to update user record")
            },

            UserApiError::List(ListUsersError::Database(e)) => database_error(&e),
            UserApiError::Count(CountUsersError::Database(e)) => database_error(&e),

            UserApiError::Get(e @ GetUserError::InvalidId) => validation_error(e.to_string()),
            UserApiError::Get(e @ GetUserError::NotFound) => not_found(e.to_string()),
            UserApiError::Get(GetUserError::Database(e)) => database_error(&e),
        }
    }
}
