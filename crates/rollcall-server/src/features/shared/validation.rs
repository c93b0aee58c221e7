//! Shared validation utilities
//!
//! Input checks used by more than one command: blank detection, email
//! normalisation, password hashing and photo upload limits.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Minimum length for a new password
pub const MIN_PASSWORD_LEN: usize = 6;

/// Upper bound for student photos (5 MiB)
pub const MAX_STUDENT_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Upper bound for account photos (500 KiB)
pub const MAX_USER_PHOTO_BYTES: usize = 500 * 1024;

/// True for empty or whitespace-only input
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// True when `value` is present and not blank
pub fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !is_blank(v))
}

/// Emails are stored and compared lower-cased and trimmed
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hex-encoded SHA-256 digest of `password`
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parse a positive numeric identifier
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Positive identifier sent as a JSON number or numeric string
pub fn json_id(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64().filter(|id| *id > 0),
        serde_json::Value::String(s) => parse_id(s),
        _ => None,
    }
}

/// Errors raised when checking an uploaded photo
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageValidationError {
    #[error("File must be an image")]
    NotAnImage,

    #[error("File size must be less than {limit}")]
    TooLarge { limit: String },
}

/// Accept only `image/*` payloads no larger than `max_bytes`.
pub fn validate_image(
    content_type: Option<&str>,
    size: usize,
    max_bytes: usize,
) -> Result<(), ImageValidationError> {
    if !content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/")) {
        return Err(ImageValidationError::NotAnImage);
    }

    if size > max_bytes {
        return Err(ImageValidationError::TooLarge {
            limit: size_label(max_bytes),
        });
    }

    Ok(())
}

fn size_label(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{}KB", bytes / 1024)
    }
}
