//! Feature modules implementing the Rollcall API
//!
//! This module contains all feature slices following the CQRS (Command Query Responsibility
//! Segregation) pattern. Each feature is organized as a vertical slice with its own
//! commands, queries, and routes.
//!
//! # Features
//!
//! - **students**: Student records, batch import, CSV export and photos
//! - **users**: School and distributor accounts
//! - **auth**: Login and password changes
//! - **files**: Batch file upload, listing and signed downloads
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations (create, update, delete, upload)
//! - `queries/` - Read operations (get, list, export)
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - Row and response types (if needed)
//!
//! Commands and queries implement the mediator pattern using the `mediator` crate,
//! enabling clean separation of concerns and easy testing.

pub mod auth;
pub mod files;
pub mod shared;
pub mod students;
pub mod users;

use axum::{extract::FromRef, Router};
use crate::storage::Storage;

/// Shared state for all feature routes
///
/// Handlers extract either half directly (`State<PgPool>` or
/// `State<Storage>`).
#[derive(Clone, FromRef)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: sqlx::PgPool,
    /// S3-compatible storage backend for file operations
    pub storage: Storage,
}

/// Creates the main API router with all feature routes mounted
///
/// Each feature is mounted under its own path prefix:
/// - `/students` - Student records, import, export and photos
/// - `/users` - School and distributor accounts
/// - `/auth` - Login and password changes
/// - `/files` - Batch file upload/download
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/students", students::students_routes())
        .nest("/users", users::users_routes())
        .nest("/auth", auth::auth_routes())
        .nest("/files", files::files_routes())
        .with_state(state)
}
