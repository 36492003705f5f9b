//! Geological class types

use serde::{Deserialize, Serialize};

use super::{non_blank, reject, FieldErrors};

/// Stored geological class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeologicalClass {
    pub id: i64,
    pub section_id: i64,
    pub name: String,
    pub code: String,
}

/// Name and code of a class, as nested in sections and spreadsheet rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    pub code: String,
}

impl ClassEntry {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

impl From<&GeologicalClass> for ClassEntry {
    fn from(class: &GeologicalClass) -> Self {
        Self {
            name: class.name.clone(),
            code: class.code.clone(),
        }
    }
}

/// Incoming class payload, validated before use
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeologicalClassRequest {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl GeologicalClassRequest {
    /// Validate a standalone class request
    pub fn validate(&self) -> Result<ClassEntry, FieldErrors> {
        let mut errors = FieldErrors::new();
        match self.collect("", &mut errors) {
            Some(entry) if errors.is_empty() => Ok(entry),
            _ => Err(errors),
        }
    }

    /// Validate as a nested field, prefixing error keys with `prefix`
    pub(crate) fn collect(&self, prefix: &str, errors: &mut FieldErrors) -> Option<ClassEntry> {
        let name = non_blank(&self.name);
        let code = non_blank(&self.code);

        if name.is_none() {
            reject(errors, format!("{prefix}name"), "Name is mandatory");
        }
        if code.is_none() {
            reject(errors, format!("{prefix}code"), "Code is mandatory");
        }

        Some(ClassEntry::new(name?, code?))
    }
}

/// Class as returned by the geological class endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeologicalClassResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub section_id: i64,
}

impl From<&GeologicalClass> for GeologicalClassResponse {
    fn from(class: &GeologicalClass) -> Self {
        Self {
            id: class.id,
            name: class.name.clone(),
            code: class.code.clone(),
            section_id: class.section_id,
        }
    }
}
