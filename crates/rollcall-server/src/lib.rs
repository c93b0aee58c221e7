//! Rollcall Server Library
#![recursion_limit = "256"]
//!
//! Multi-tenant record service for schools and the distributors that serve
//! them: student records and photos, school / distributor accounts, and a
//! batch import pipeline for spreadsheet rosters.
//!
//! # Architecture
//!
//! Each feature under [`features`] is a vertical slice of commands (writes)
//! and queries (reads). Every request type carries its own validation and
//! error enum and is handled by a plain `async fn handle`. Routes call the
//! handlers directly; [`cqrs::build_mediator`] registers the same handlers
//! for in-process use.
//!
//! - **Students**: CRUD, batch scoping, CSV export, photo listing and ZIP archive
//! - **Users**: school and distributor accounts with auto-assigned codes
//! - **Auth**: login and password change against SHA-256 hashes
//! - **Files**: raw batch file upload, listing and signed downloads
//! - **Import**: CSV / Excel parsing, header mapping and chunked inserts
//!
//! ## Framework Stack
//!
//! - **Axum** for routing and extraction
//! - **SQLx** against PostgreSQL
//! - **aws-sdk-s3** for the blob store
//! - **Tower** for middleware
//!
//! # Example
//!
//! ```no_run
//! use rollcall_server::{api, config::Config, db, features::FeatureState};
//! use rollcall_server::storage::{config::StorageConfig, Storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let db = db::create_pool(&config.database).await?;
//!     let storage = Storage::new(StorageConfig::from_env()?).await?;
//!     api::serve(config, FeatureState { db, storage }).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod import;
pub mod middleware;
pub mod storage;

pub use error::{ServerError, ServerResult};
