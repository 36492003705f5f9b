//! Section data types
//!
//! A section is a named geological cross-section holding an ordered list
//! of geological classes.

use serde::{Deserialize, Serialize};

use super::geological_class::{ClassEntry, GeologicalClass, GeologicalClassRequest};
use super::{non_blank, reject, FieldErrors};

/// Full section record with its classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub name: String,
    /// Import job that created the section, if any
    pub job_id: Option<String>,
    pub geological_classes: Vec<GeologicalClass>,
}

/// Validated section contents, ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection {
    pub name: String,
    pub geological_classes: Vec<ClassEntry>,
}

impl NewSection {
    pub fn new(name: impl Into<String>, geological_classes: Vec<ClassEntry>) -> Self {
        Self {
            name: name.into(),
            geological_classes,
        }
    }
}

/// Incoming section payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRequest {
    pub name: Option<String>,
    pub geological_classes: Option<Vec<GeologicalClassRequest>>,
}

impl SectionRequest {
    /// Validate the request, collecting every field error
    pub fn validate(&self) -> Result<NewSection, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = non_blank(&self.name);
        if name.is_none() {
            reject(&mut errors, "name".to_string(), "Name is mandatory");
        }

        let mut classes = Vec::new();
        match &self.geological_classes {
            Some(requests) => {
                for (i, request) in requests.iter().enumerate() {
                    let prefix = format!("geologicalClasses[{i}].");
                    if let Some(entry) = request.collect(&prefix, &mut errors) {
                        classes.push(entry);
                    }
                }
            }
            None => reject(
                &mut errors,
                "geologicalClasses".to_string(),
                "Geological classes cannot be null",
            ),
        }

        match name {
            Some(name) if errors.is_empty() => Ok(NewSection::new(name, classes)),
            _ => Err(errors),
        }
    }
}

/// Section as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionResponse {
    pub id: i64,
    pub name: String,
    pub geological_classes: Vec<ClassEntry>,
}

impl From<&Section> for SectionResponse {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id,
            name: section.name.clone(),
            geological_classes: section
                .geological_classes
                .iter()
                .map(ClassEntry::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_request() -> SectionRequest {
        SectionRequest {
            name: Some("Section 1".to_string()),
            geological_classes: Some(vec![
                GeologicalClassRequest {
                    name: Some("Geo Class 11".to_string()),
                    code: Some("GC11".to_string()),
                },
                GeologicalClassRequest {
                    name: Some("Geo Class 12".to_string()),
                    code: Some("GC12".to_string()),
                },
            ]),
        }
    }

    #[test]
    fn test_validate_valid_request() {
        let section = create_test_request().validate().unwrap();
        assert_eq!(section.name, "Section 1");
        assert_eq!(section.geological_classes.len(), 2);
        assert_eq!(section.geological_classes[1], ClassEntry::new("Geo Class 12", "GC12"));
    }

    #[test]
    fn test_validate_missing_name_and_classes() {
        let request = SectionRequest::default();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.get("name").unwrap(), "Name is mandatory");
        assert_eq!(
            errors.get("geologicalClasses").unwrap(),
            "Geological classes cannot be null"
        );
    }

    #[test]
    fn test_validate_nested_class_errors() {
        let mut request = create_test_request();
        if let Some(classes) = request.geological_classes.as_mut() {
            classes[1].code = Some(String::new());
        }
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("geologicalClasses[1].code").unwrap(),
            "Code is mandatory"
        );
    }

    #[test]
    fn test_empty_class_list_is_valid() {
        let request = SectionRequest {
            name: Some("Bare".to_string()),
            geological_classes: Some(vec![]),
        };
        assert!(request.validate().unwrap().geological_classes.is_empty());
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: SectionRequest = serde_json::from_str(
            r#"{"name":"S","geologicalClasses":[{"name":"n","code":"c"}]}"#,
        )
        .unwrap();
        assert_eq!(request.geological_classes.unwrap().len(), 1);
    }
}
