//! Batch student import
//!
//! ```text
//! file bytes ─▶ parser ─▶ mapping ─▶ validation ─▶ storage (chunks of 100)
//! ```
//!
//! - [`parser`]: extension sniffing, CSV / workbook row extraction
//! - [`mapping`]: header row to column indices
//! - [`validation`]: row filtering, trimming, `schoolId` coercion
//! - [`storage`]: sequential chunked INSERTs with per-chunk error capture
//! - [`sample`]: the downloadable template file
//! - [`pipeline`]: wires the stages together

pub mod mapping;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod sample;
pub mod storage;
pub mod validation;

pub use models::{ImportError, ImportRequest, ImportResult, StudentField, StudentRecord};
pub use pipeline::run_import;
pub use storage::{PgStudentSink, StudentSink, CHUNK_SIZE};
