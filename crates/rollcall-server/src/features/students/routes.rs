//! Student API routes
//!
//! - `GET /api/v1/students` - List a school's students (`schoolId` or `email`, optional `batch`)
//! - `POST /api/v1/students` - Create a student
//! - `GET /api/v1/students/count` - Count students, optionally per school
//! - `GET /api/v1/students/export` - Download the selection as CSV
//! - `GET /api/v1/students/photos` - Students with photos and their signed URLs
//! - `GET /api/v1/students/photos/archive` - The same photos as a ZIP
//! - `POST /api/v1/students/import` - Batch import from CSV / Excel (multipart)
//! - `GET /api/v1/students/import/sample` - Import template
//! - `POST /api/v1/students/upload-photo` - Attach a photo (multipart)
//! - `GET|PUT|DELETE /api/v1/students/:id`

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::{
    commands::{
        CreateStudentCommand, CreateStudentError, DeleteStudentCommand, DeleteStudentError,
        ImportStudentsCommand, ImportStudentsError, UpdateStudentCommand, UpdateStudentError,
        UploadStudentPhotoCommand, UploadStudentPhotoError,
    },
    queries::{
        CountStudentsError, CountStudentsQuery, ExportStudentsError, ExportStudentsQuery,
        GetStudentError, GetStudentQuery, ListStudentsError, ListStudentsQuery,
        PhotoArchiveError, PhotoArchiveQuery, StudentPhotosError, StudentPhotosQuery,
    },
    scope::ScopeError,
};
use crate::api::response::{
    attachment, internal_error, not_found, validation_error, ApiResponse, ErrorResponse,
};
use crate::features::shared::photos::PhotoUploadError;
use crate::features::shared::validation::parse_id;
use crate::features::shared::MultipartForm;
use crate::features::FeatureState;
use crate::import::{sample, ImportError};
use crate::storage::Storage;

pub fn students_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/count", get(count_students))
        .route("/export", get(export_students))
        .route("/photos", get(student_photos))
        .route("/photos/archive", get(photo_archive))
        .route("/import", post(import_students))
        .route("/import/sample", get(import_sample))
        .route("/upload-photo", post(upload_photo))
        .route(
            "/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
}

fn student_id(raw: &str) -> Result<i64, StudentApiError> {
    parse_id(raw).ok_or(StudentApiError::InvalidId)
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

#[tracing::instrument(skip(pool, command))]
async fn create_student(
    State(pool): State<PgPool>,
    Json(command): Json<CreateStudentCommand>,
) -> Result<Response, StudentApiError> {
    let student = super::commands::create::handle(pool, command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(student).with_message("Student added successfully")),
    )
        .into_response())
}

#[tracing::instrument(skip(pool, storage, command))]
async fn update_student(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Path(id): Path<String>,
    Json(mut command): Json<UpdateStudentCommand>,
) -> Result<Response, StudentApiError> {
    command.id = student_id(&id)?;

    let student = super::commands::update::handle(pool, storage, command).await?;

    Ok(ApiResponse::success(student)
        .with_message("Student updated successfully")
        .into_response())
}

#[tracing::instrument(skip(pool, storage))]
async fn delete_student(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Path(id): Path<String>,
) -> Result<Response, StudentApiError> {
    let command = DeleteStudentCommand { id: student_id(&id)? };

    let response = super::commands::delete::handle(pool, storage, command).await?;

    Ok(ApiResponse::success(response)
        .with_message("Student deleted successfully")
        .into_response())
}

#[tracing::instrument(skip(pool, multipart))]
async fn import_students(
    State(pool): State<PgPool>,
    multipart: Multipart,
) -> Result<Response, StudentApiError> {
    let mut form = MultipartForm::read(multipart).await?;

    let command = ImportStudentsCommand {
        file: form.take_file(&["file", "csv"]),
        school_id: form.text("schoolId").map(str::to_string),
        distributor: form.text("distributor").map(str::to_string),
    };

    let result = super::commands::import::handle(pool, command).await?;

    if result.is_total_failure() {
        tracing::error!(total = result.total, errors = ?result.errors, "Import stored nothing");
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Failed to import students",
                "imported": result.imported,
                "total": result.total,
                "errors": result.errors,
            })),
        )
            .into_response());
    }

    let message = if result.errors.is_empty() {
        format!("Successfully imported {} students", result.imported)
    } else {
        format!(
            "Imported {} of {} students; {} chunk(s) failed",
            result.imported,
            result.total,
            result.errors.len()
        )
    };

    let mut body = json!({
        "success": true,
        "message": message,
        "imported": result.imported,
        "total": result.total,
    });
    if !result.errors.is_empty() {
        body["errors"] = json!(result.errors);
    }

    Ok((StatusCode::OK, Json(body)).into_response())
}

#[tracing::instrument(skip(pool, storage, multipart))]
async fn upload_photo(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    multipart: Multipart,
) -> Result<Response, StudentApiError> {
    let mut form = MultipartForm::read(multipart).await?;

    let command = UploadStudentPhotoCommand {
        student_id: form.text("studentId").and_then(parse_id),
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
async fn list_students(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Query(query): Query<ListStudentsQuery>,
) -> Result<Response, StudentApiError> {
    let students = super::queries::list::handle(pool, storage, query).await?;

    Ok(ApiResponse::list(students).into_response())
}

#[tracing::instrument(skip(pool))]
async fn count_students(
    State(pool): State<PgPool>,
    Query(query): Query<CountStudentsQuery>,
) -> Result<Response, StudentApiError> {
    let response = super::queries::count::handle(pool, query).await?;

    Ok(Json(json!({ "success": true, "count": response.count })).into_response())
}

#[tracing::instrument(skip(pool, storage))]
async fn get_student(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Path(id): Path<String>,
) -> Result<Response, StudentApiError> {
    let query = GetStudentQuery { id: student_id(&id)? };

    let student = super::queries::get::handle(pool, storage, query).await?;

    Ok(ApiResponse::success(student).into_response())
}

#[tracing::instrument(skip(pool, storage))]
async fn export_students(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Query(query): Query<ExportStudentsQuery>,
) -> Result<Response, StudentApiError> {
    let file = super::queries::export::handle(pool, storage, query).await?;

    Ok(attachment(&file.file_name, "text/csv; charset=utf-8", file.content))
}

#[tracing::instrument(skip(pool, storage))]
async fn student_photos(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Query(query): Query<StudentPhotosQuery>,
) -> Result<Response, StudentApiError> {
    let response = super::queries::photos::handle(pool, storage, query).await?;

    Ok(Json(json!({
        "success": true,
        "count": response.count,
        "photos": response.photos,
    }))
    .into_response())
}

#[tracing::instrument(skip(pool, storage))]
async fn photo_archive(
    State(pool): State<PgPool>,
    State(storage): State<Storage>,
    Query(query): Query<PhotoArchiveQuery>,
) -> Result<Response, StudentApiError> {
    let archive = super::queries::photos_archive::handle(pool, storage, query).await?;

    Ok(attachment(&archive.file_name, "application/zip", archive.content))
}

async fn import_sample() -> Response {
    attachment(
        sample::SAMPLE_FILE_NAME,
        sample::SAMPLE_CONTENT_TYPE,
        sample::sample_csv().into_bytes(),
    )
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum StudentApiError {
    InvalidId,
    Multipart(MultipartError),
    Create(CreateStudentError),
    Update(UpdateStudentError),
    Delete(DeleteStudentError),
    Import(ImportStudentsError),
    Photo(UploadStudentPhotoError),
    List(ListStudentsError),
    Count(CountStudentsError),
    Get(GetStudentError),
    Export(ExportStudentsError),
    Photos(StudentPhotosError),
    Archive(PhotoArchiveError),
}

macro_rules! from_error {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for StudentApiError {
                fn from(err: $source) -> Self {
                    Self::$variant(err)
                }
            }
        )*
    };
}

from_error! {
    MultipartError => Multipart,
    CreateStudentError => Create,
    UpdateStudentError => Update,
    DeleteStudentError => Delete,
    ImportStudentsError => Import,
    UploadStudentPhotoError => Photo,
    ListStudentsError => List,
    CountStudentsError => Count,
    GetStudentError => Get,
    ExportStudentsError => Export,
    StudentPhotosError => Photos,
    PhotoArchiveError => Archive,
}

fn database_error(err: &sqlx::Error) -> Response {
    tracing::error!(error = %err, "Student query failed");
    internal_error("DATABASE_ERROR", "Database operation failed")
}

fn scope_error(err: ScopeError) -> Response {
    match err {
        ScopeError::Missing | ScopeError::InvalidSchoolId => validation_error(err.to_string()),
        ScopeError::UnknownEmail => not_found(err.to_string()),
        ScopeError::Database(e) => database_error(&e),
    }
}

fn import_error(err: ImportError) -> Response {
    let code = match err {
        ImportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
        ImportError::EmptyFile => "EMPTY_FILE",
        ImportError::MissingColumn(_) => "MISSING_COLUMN",
        ImportError::NoValidRows => "NO_VALID_ROWS",
        ImportError::Malformed(_) => "MALFORMED_FILE",
    };
    ErrorResponse::new(code, err.to_string()).into_response_with(StatusCode::BAD_REQUEST)
}

impl IntoResponse for StudentApiError {
    fn into_response(self) -> Response {
        match self {
            StudentApiError::InvalidId => validation_error("Invalid student ID"),
            StudentApiError::Multipart(e) => {
                ErrorResponse::new("INVALID_MULTIPART", e.body_text())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },

            StudentApiError::Create(e @ CreateStudentError::MissingFields)
            | StudentApiError::Create(e @ CreateStudentError::DuplicateAdmissionNo)
            | StudentApiError::Create(e @ CreateStudentError::UnknownSchool) => {
                validation_error(e.to_string())
            },
            StudentApiError::Create(CreateStudentError::Database(e)) => database_error(&e),

            StudentApiError::Update(e @ UpdateStudentError::InvalidId)
            | StudentApiError::Update(e @ UpdateStudentError::MissingFields)
            | StudentApiError::Update(e @ UpdateStudentError::DuplicateAdmissionNo) => {
                validation_error(e.to_string())
            },
            StudentApiError::Update(e @ UpdateStudentError::NotFound) => not_found(e.to_string()),
            StudentApiError::Update(UpdateStudentError::Database(e)) => database_error(&e),

            StudentApiError::Delete(e @ DeleteStudentError::InvalidId) => {
                validation_error(e.to_string())
            },
            StudentApiError::Delete(e @ DeleteStudentError::NotFound) => not_found(e.to_string()),
            StudentApiError::Delete(DeleteStudentError::Database(e)) => database_error(&e),

            StudentApiError::Import(e @ ImportStudentsError::FileRequired) => {
                validation_error(e.to_string())
            },
            StudentApiError::Import(ImportStudentsError::Import(e)) => import_error(e),

            StudentApiError::Photo(e @ PhotoUploadError::MissingInput(_))
            | StudentApiError::Photo(e @ PhotoUploadError::Image(_)) => {
                validation_error(e.to_string())
            },
            StudentApiError::Photo(e @ PhotoUploadError::NotFound(_)) => not_found(e.to_string()),
            StudentApiError::Photo(PhotoUploadError::Upload(e)) => {
                tracing::error!(error = %format!("{e:#}"), "Student photo upload failed");
                internal_error("STORAGE_ERROR", "Failed to upload photo")
            },
            StudentApiError::Photo(PhotoUploadError::Database(e)) => {
                tracing::error!(error = %e, "Student photo row update failed");
                internal_error("DATABASE_ERROR", "Failed to update student record")
            },

            StudentApiError::List(ListStudentsError::Scope(e)) => scope_error(e),
            StudentApiError::List(ListStudentsError::Database(e)) => database_error(&e),

            StudentApiError::Count(e @ CountStudentsError::InvalidSchoolId) => {
                validation_error(e.to_string())
            },
            StudentApiError::Count(CountStudentsError::Database(e)) => database_error(&e),

            StudentApiError::Get(e @ GetStudentError::InvalidId) => validation_error(e.to_string()),
            StudentApiError::Get(e @ GetStudentError::NotFound) => not_found(e.to_string()),
            StudentApiError::Get(GetStudentError::Database(e)) => database_error(&e),

            StudentApiError::Export(ExportStudentsError::Scope(e)) => scope_error(e),
            StudentApiError::Export(e @ ExportStudentsError::NoStudents) => {
                not_found(e.to_string())
            },
            StudentApiError::Export(ExportStudentsError::Database(e)) => database_error(&e),
            StudentApiError::Export(e) => {
                tracing::error!(error = %e, "Student export failed");
                internal_error("EXPORT_ERROR", "Failed to export students")
            },

            StudentApiError::Photos(StudentPhotosError::Scope(e)) => scope_error(e),
            StudentApiError::Photos(e @ StudentPhotosError::NoPhotos) => not_found(e.to_string()),
            StudentApiError::Photos(StudentPhotosError::Database(e)) => database_error(&e),

            StudentApiError::Archive(PhotoArchiveError::Scope(e)) => scope_error(e),
            StudentApiError::Archive(e @ PhotoArchiveError::NoPhotos) => not_found(e.to_string()),
            StudentApiError::Archive(PhotoArchiveError::Database(e)) => database_error(&e),
            StudentApiError::Archive(e) => {
                tracing::error!(error = %e, "Photo archive failed");
                internal_error("ARCHIVE_ERROR", "Failed to build photo archive")
            },
        }
    }
}
