//! Upload filename validation and sanitization.
//!
//! Uploaded filenames are attacker-controlled. Before one is used to name
//! a file on disk or to look a stored model up again, it is reduced to a
//! safe character set and its extension checked against the formats the
//! slicer understands.

use crate::error::CoreError;

/// Model formats accepted at upload. `3mf` is converted to STL before
/// slicing.
pub const ALLOWED_EXTENSIONS: &[&str] = &["stl", "3mf", "obj"];

/// Maximum accepted filename length after sanitization.
const MAX_FILENAME_LEN: usize = 200;

/// Lower-cased extension of a filename, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Validate an uploaded filename and return its lower-cased extension.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_FILENAME_LEN` characters.
/// - Extension must be one of [`ALLOWED_EXTENSIONS`].
pub fn validate_upload_filename(filename: &str) -> Result<String, CoreError> {
    if filename.is_empty() {
        return Err(CoreError::Validation(
            "No file selected".to_string(),
        ));
    }
    if filename.len() > MAX_FILENAME_LEN {
        return Err(CoreError::Validation(format!(
            "Filename must not exceed {MAX_FILENAME_LEN} characters"
        )));
    }
    match file_extension(filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(CoreError::Validation(format!(
            "Unsupported file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}

/// Reduce a filename to a safe form: path components stripped, every
/// character outside `[A-Za-z0-9._-]` replaced with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether a name names a stored file directly, with no traversal.
///
/// Used by the file download endpoint: only plain sanitized names are
/// servable, anything with separators or `..` is rejected.
pub fn is_safe_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
