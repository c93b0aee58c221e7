//! Mediator wiring for every command and query handler
//!
//! Routes call handlers directly; the mediator exposes the same handlers to
//! in-process callers such as background tasks and tests.

pub use mediator::DefaultAsyncMediator;
use sqlx::PgPool;

use crate::storage::Storage;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

/// Handler that only needs the database
macro_rules! db_handler {
    ($pool:ident, $handler:path) => {{
        let $pool = $pool.clone();
        move |request| {
            let $pool = $pool.clone();
            async move { $handler($pool, request).await }
        }
    }};
}

/// Handler that only needs object storage
macro_rules! storage_handler {
    ($storage:ident, $handler:path) => {{
        let $storage = $storage.clone();
        move |request| {
            let $storage = $storage.clone();
            async move { $handler($storage, request).await }
        }
    }};
}

/// Handler that needs the database and object storage
macro_rules! db_storage_handler {
    ($pool:ident, $storage:ident, $handler:path) => {{
        let $pool = $pool.clone();
        let $storage = $storage.clone();
        move |request| {
            let $pool = $pool.clone();
            let $storage = $storage.clone();
            async move { $handler($pool, $storage, request).await }
        }
    }};
}

pub fn build_mediator(pool: PgPool, storage: Storage) -> AppMediator {
    use crate::features::{auth, files, students, users};

    DefaultAsyncMediator::builder()
        // Students
        .add_handler(db_handler!(pool, students::commands::create::handle))
        .add_handler(db_storage_handler!(pool, storage, students::commands::update::handle))
        .add_handler(db_storage_handler!(pool, storage, students::commands::delete::handle))
        .add_handler(db_storage_handler!(pool, storage, students::commands::upload_photo::handle))
        .add_handler(db_handler!(pool, students::commands::import::handle))
        .add_handler(db_storage_handler!(pool, storage, students::queries::list::handle))
        .add_handler(db_storage_handler!(pool, storage, students::queries::get::handle))
        .add_handler(db_handler!(pool, students::queries::count::handle))
        .add_handler(db_storage_handler!(pool, storage, students::queries::export::handle))
        .add_handler(db_storage_handler!(pool, storage, students::queries::photos::handle))
        .add_handler(db_storage_handler!(pool, storage, students::queries::photos_archive::handle))
        // Users
        .add_handler(db_handler!(pool, users::commands::create::handle))
        .add_handler(db_storage_handler!(pool, storage, users::commands::update::handle))
        .add_handler(db_storage_handler!(pool, storage, users::commands::delete::handle))
        .add_handler(db_storage_handler!(pool, storage, users::commands::upload_photo::handle))
        .add_handler(db_storage_handler!(pool, storage, users::queries::list::handle))
        .add_handler(db_storage_handler!(pool, storage, users::queries::get::handle))
        .add_handler(db_handler!(pool, users::queries::count::handle))
        // Auth
        .add_handler(db_handler!(pool, auth::commands::login::handle))
        .add_handler(db_handler!(pool, auth::commands::change_password::handle))
        // Batch files
        .add_handler(storage_handler!(storage, files::commands::upload::handle))
        .add_handler(storage_handler!(storage, files::queries::list::handle))
        .add_handler(storage_handler!(storage, files::queries::download::handle))
        .build()
}
