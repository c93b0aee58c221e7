//! Shared utilities and types for feature modules
//!
//! - **validation**: Input validation, password hashing and photo limits
//! - **error_helpers**: Database constraint violation helpers
//! - **multipart**: Buffered multipart form reading
//! - **photos**: Photo replacement shared by students and users

pub mod error_helpers;
pub mod multipart;
pub mod photos;
pub mod validation;

pub use multipart::{MultipartForm, UploadedFile};
pub use validation::{hash_password, normalize_email};
