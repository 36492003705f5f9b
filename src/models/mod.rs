//! Data models module
//!
//! Contains all data structures used throughout the application:
//! - Section and geological class entities
//! - Job records for imports and exports
//! - API request and response types

pub mod section;
pub mod geological_class;
pub mod job;

use std::collections::BTreeMap;

/// Validation failures keyed by field path, e.g. `geologicalClasses[0].code`
pub type FieldErrors = BTreeMap<String, String>;

/// Record a field error, keeping the first message for a field
pub(crate) fn reject(errors: &mut FieldErrors, field: String, message: &str) {
    errors.entry(field).or_insert_with(|| message.to_string());
}

/// Trimmed, non-empty value of an optional string field
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
