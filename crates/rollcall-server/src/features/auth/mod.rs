//! Credential checks against stored password digests

pub mod commands;
pub mod routes;

pub use commands::{ChangePasswordCommand, LoginCommand};
pub use routes::auth_routes;
