//! Server-specific error types
//!
//! Request-level failures are modelled per command and mapped to HTTP in each
//! feature's `routes.rs`. [`ServerError`] covers everything that can go wrong
//! while bringing the server up or tearing it down.

use thiserror::Error;

/// Result type alias for server operations
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Startup / shutdown error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] rollcall_common::RollcallError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("Invalid bind address '{addr}': {source}")]
    BindAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

impl ServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address_message() {
        let source = "nope".parse::<std::net::SocketAddr>().unwrap_err();
        let err = ServerError::BindAddress {
            addr: "nope".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid bind address 'nope'"));
    }

    #[test]
    fn test_common_error_is_transparent() {
        let err: ServerError = rollcall_common::RollcallError::config("bad").into();
        assert_eq!(
            err.to_string(),
            rollcall_common::RollcallError::config("bad").to_string()
        );
    }
}
