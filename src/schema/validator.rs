//! Declarative constraint validation
//!
//! Runs a resource schema's declared constraints against a document before
//! any mutation. Violations are grouped by field path and joined into
//! `StructuredError`s for the constraint-violation failure; grouping and
//! ordering by field is stable so the same payload always produces the same
//! report.
//!
//! The validator is an optional collaborator: a service constructed without
//! one skips validation entirely (degrade-open).

use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::StructuredError;
use super::types::{Constraint, FieldType, ResourceSchema, TENANT_FIELD};

/// One raw constraint violation
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Field path the violation is anchored to
    pub path: String,
    pub message: String,
    /// The offending value, echoed back to the caller
    pub data: Value,
}

impl Violation {
    fn new(path: impl Into<String>, message: impl Into<String>, data: Value) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            data,
        }
    }
}

/// Declarative validation capability
pub trait Validator: Send + Sync {
    fn validate(&self, schema: &ResourceSchema, doc: &Value) -> Vec<Violation>;
}

/// Validator enforcing the schema's declared field constraints
#[derive(Debug, Default)]
pub struct ConstraintValidator;

impl ConstraintValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Validator for ConstraintValidator {
    fn validate(&self, schema: &ResourceSchema, doc: &Value) -> Vec<Violation> {
        let Some(obj) = doc.as_object() else {
            return vec![Violation::new("$root", "must be an object", doc.clone())];
        };

        let mut violations = Vec::new();

        // Undeclared fields are rejected; the reserved tenant field is
        // injected by the service and invisible here.
        for key in obj.keys() {
            if key != TENANT_FIELD && schema.field(key).is_none() {
                violations.push(Violation::new(
                    key.clone(),
                    "is not a declared property",
                    obj[key].clone(),
                ));
            }
        }

        for field in &schema.fields {
            let value = obj.get(&field.name);
            let missing_or_null = matches!(value, None | Some(Value::Null));

            if missing_or_null {
                let null_forbidden =
                    field.required || field.constraints.contains(&Constraint::NotNull);
                // A missing optional field is fine; an explicit null trips
                // NotNull, and required fields must be present and non-null.
                if null_forbidden && (field.required || value.is_some()) {
                    violations.push(Violation::new(
                        field.name.clone(),
                        "must not be null",
                        value.cloned().unwrap_or(Value::Null),
                    ));
                }
                continue;
            }

            let Some(value) = value else {
                continue;
            };

            if let Some(violation) = check_type(field.name.as_str(), &field.field_type, value) {
                violations.push(violation);
                continue;
            }

            if field.constraints.contains(&Constraint::NotEmpty) {
                if let Some(s) = value.as_str() {
                    if s.is_empty() {
                        violations.push(Violation::new(
                            field.name.clone(),
                            "must not be empty",
                            value.clone(),
                        ));
                    }
                }
            }
        }

        violations
    }
}

/// Check a non-null value against its declared type
fn check_type(path: &str, expected: &FieldType, value: &Value) -> Option<Violation> {
    let ok = match expected {
        FieldType::Id | FieldType::Str => value.is_string(),
        FieldType::Int => value.is_i64() || value.is_u64(),
        FieldType::Float => value.is_number(),
        FieldType::Bool => value.is_boolean(),
        FieldType::Datetime => value
            .as_str()
            .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
            .unwrap_or(false),
        FieldType::Relation { .. } => value
            .as_array()
            .map(|items| items.iter().all(Value::is_string))
            .unwrap_or(false),
    };

    if ok {
        None
    } else {
        Some(Violation::new(
            path,
            format!("must be of type {}", expected.name()),
            value.clone(),
        ))
    }
}

/// Group violations by field path into structured errors.
///
/// Per-field messages are joined with `", "`; the result is ordered by field
/// path, and `data` echoes the field's offending value.
pub fn normalize(violations: Vec<Violation>) -> Vec<StructuredError> {
    let mut grouped: BTreeMap<String, (Vec<String>, Value)> = BTreeMap::new();

    for violation in violations {
        let entry = grouped
            .entry(violation.path)
            .or_insert_with(|| (Vec::new(), violation.data.clone()));
        entry.0.push(violation.message);
    }

    grouped
        .into_iter()
        .map(|(field, (messages, data))| StructuredError {
            field,
            message: messages.join(", "),
            data,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::FieldDef;
    use serde_json::json;

    fn profile_schema() -> ResourceSchema {
        ResourceSchema::new(
            "profile",
            vec![
                FieldDef::identity("id"),
                FieldDef::new("bio", FieldType::Str)
                    .required()
                    .constrained(Constraint::NotEmpty),
                FieldDef::new("dob", FieldType::Datetime).constrained(Constraint::NotNull),
                FieldDef::new("age", FieldType::Int),
                FieldDef::relation("sessions", "session"),
            ],
        )
    }

    #[test]
    fn test_valid_document_passes() {
        let validator = ConstraintValidator::new();
        let doc = json!({
            "id": "p1",
            "bio": "hello",
            "dob": "1990-04-01T00:00:00Z",
            "age": 33,
            "tenant_id": "t1"
        });

        assert!(validator.validate(&profile_schema(), &doc).is_empty());
    }

    #[test]
    fn test_empty_bio_and_null_dob_are_two_errors() {
        let validator = ConstraintValidator::new();
        let doc = json!({"id": "p1", "bio": "", "dob": null});

        let errors = normalize(validator.validate(&profile_schema(), &doc));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "bio");
        assert_eq!(errors[0].message, "must not be empty");
        assert_eq!(errors[1].field, "dob");
        assert_eq!(errors[1].message, "must not be null");
    }

    #[test]
    fn test_missing_required_field() {
        let validator = ConstraintValidator::new();
        let doc = json!({"id": "p1"});

        let errors = normalize(validator.validate(&profile_schema(), &doc));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "bio");
        assert_eq!(errors[0].message, "must not be null");
    }

    #[test]
    fn test_missing_optional_field_is_fine() {
        let validator = ConstraintValidator::new();
        // dob carries NotNull but is optional: absent is fine, null is not.
        let doc = json!({"id": "p1", "bio": "x"});

        assert!(validator.validate(&profile_schema(), &doc).is_empty());
    }

    #[test]
    fn test_type_mismatch() {
        let validator = ConstraintValidator::new();
        let doc = json!({"id": "p1", "bio": "x", "age": "old"});

        let errors = normalize(validator.validate(&profile_schema(), &doc));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "age");
        assert_eq!(errors[0].message, "must be of type int");
        assert_eq!(errors[0].data, json!("old"));
    }

    #[test]
    fn test_undeclared_field_rejected() {
        let validator = ConstraintValidator::new();
        let doc = json!({"id": "p1", "bio": "x", "nickname": "zed"});

        let errors = normalize(validator.validate(&profile_schema(), &doc));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "nickname");
    }

    #[test]
    fn test_relation_must_be_id_list() {
        let validator = ConstraintValidator::new();
        let doc = json!({"id": "p1", "bio": "x", "sessions": ["s1", 2]});

        let errors = normalize(validator.validate(&profile_schema(), &doc));
        assert_eq!(errors[0].field, "sessions");
        assert_eq!(errors[0].message, "must be of type relation");
    }

    #[test]
    fn test_messages_joined_per_field() {
        let violations = vec![
            Violation::new("bio", "must not be empty", json!("")),
            Violation::new("bio", "looks suspicious", json!("")),
        ];

        let errors = normalize(violations);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "must not be empty, looks suspicious");
    }

    #[test]
    fn test_non_object_document() {
        let validator = ConstraintValidator::new();
        let errors = validator.validate(&profile_schema(), &json!([1, 2]));
        assert_eq!(errors[0].path, "$root");
    }
}
