//! Rollcall Server - Main entry point

use rollcall_common::logging::{init_logging, LogConfig};
use tracing::info;

use rollcall_server::{
    api,
    config::Config,
    db,
    features::FeatureState,
    storage::{config::StorageConfig, Storage},
    ServerError, ServerResult,
};

#[tokio::main]
async fn main() -> ServerResult<()> {
    // Environment variables override these defaults
    let log_config = LogConfig::default()
        .with_file_prefix("rollcall-server")
        .with_filter_directives("rollcall_server=debug,tower_http=debug,sqlx=warn")
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting Rollcall Server");

    let config = Config::load().map_err(|e| ServerError::config(format!("{e:#}")))?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db = db::create_pool(&config.database).await?;

    let storage_config = StorageConfig::from_env().map_err(ServerError::Storage)?;
    let storage = Storage::new(storage_config)
        .await
        .map_err(ServerError::Storage)?;
    info!(bucket = storage.bucket(), "Storage client initialized");

    db::run_migrations(&db).await?;

    api::serve(config, FeatureState { db, storage }).await
}
