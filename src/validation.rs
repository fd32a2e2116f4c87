//! Upload validation
//!
//! Pure checks applied to a selected file before any decoding or network
//! access happens. Checks run in order and the first failure wins.

use crate::errors::ValidationError;
use crate::types::UploadedFile;

/// Largest accepted upload, inclusive (5 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const IMAGE_TYPE_PREFIX: &str = "image/";

/// Validate a selected file's declared type and size.
pub fn validate(file: &UploadedFile) -> Result<(), ValidationError> {
    validate_declared(&file.declared_type, file.size)
}

/// Same checks as [`validate`], on the raw declared values.
pub fn validate_declared(declared_type: &str, size: u64) -> Result<(), ValidationError> {
    if !declared_type
        .to_ascii_lowercase()
        .starts_with(IMAGE_TYPE_PREFIX)
    {
        return Err(ValidationError::NotAnImage {
            declared_type: declared_type.to_string(),
        });
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }

    Ok(())
}
