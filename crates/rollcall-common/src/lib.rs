//! Rollcall Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging setup for the Rollcall workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`RollcallError`] and the [`Result`] alias used at
//!   startup and configuration boundaries
//! - **Logging**: [`logging::init_logging`] wires `tracing-subscriber` for
//!   every binary in the workspace
//!
//! # Example
//!
//! ```no_run
//! use rollcall_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> rollcall_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("Application started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{Result, RollcallError};
