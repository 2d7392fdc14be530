//! Resource descriptors
//!
//! A descriptor is the derived metadata the engine needs about one resource
//! type: which field is the identity and which fields are relations to other
//! resource types. Derivation runs once per type at registration; the
//! invariants here fail startup, not requests.

use std::collections::BTreeMap;

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldType, ResourceSchema};

/// Derived metadata for one resource type
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    resource: String,
    path: String,
    identity_field: String,
    relations: BTreeMap<String, String>,
}

impl ResourceDescriptor {
    /// Derive a descriptor from a flattened schema (inherited fields already
    /// merged in by the registry).
    ///
    /// Exactly one field must carry the identity marker; zero or more than
    /// one is a fatal configuration error. Every relation-typed field is
    /// recorded under its field name; target existence is checked later,
    /// once all registrations are in.
    pub fn derive(schema: &ResourceSchema) -> SchemaResult<Self> {
        let identity_fields: Vec<&str> = schema
            .fields
            .iter()
            .filter(|f| f.identity)
            .map(|f| f.name.as_str())
            .collect();

        let identity_field = match identity_fields.as_slice() {
            [single] => (*single).to_string(),
            [] => {
                return Err(SchemaError::MissingIdentity {
                    resource: schema.name.clone(),
                })
            }
            many => {
                return Err(SchemaError::MultipleIdentity {
                    resource: schema.name.clone(),
                    fields: many.iter().map(|s| (*s).to_string()).collect(),
                })
            }
        };

        let mut relations = BTreeMap::new();
        for field in &schema.fields {
            if let FieldType::Relation { target } = &field.field_type {
                relations.insert(field.name.clone(), target.clone());
            }
        }

        Ok(Self {
            resource: schema.name.clone(),
            path: schema.path().to_string(),
            identity_field,
            relations,
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    /// Relation name -> target resource type, ordered by relation name
    pub fn relations(&self) -> &BTreeMap<String, String> {
        &self.relations
    }

    /// Target resource type of a named relation, if declared
    pub fn relation_target(&self, relation: &str) -> Option<&str> {
        self.relations.get(relation).map(String::as_str)
    }
}
