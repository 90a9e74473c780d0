//! Helpers for checking the required fields of JSON request bodies.

use crate::Error;

/// Get the trimmed text of a required field.
///
/// # Errors
///
/// Returns [Error::MissingField] if `value` is `None` or only whitespace.
pub(crate) fn required_text(value: Option<String>, field: &'static str) -> Result<String, Error> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_owned()),
        _ => Err(Error::MissingField(field)),
    }
}

/// Get the trimmed text of an optional field, using an empty string if it is absent.
pub(crate) fn optional_text(value: Option<String>) -> String {
    value.map(|text| text.trim().to_owned()).unwrap_or_default()
}
