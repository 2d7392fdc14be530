//! Schema registry
//!
//! Owns every registered resource schema and its derived descriptor.
//! Registration happens during single-threaded startup; `finish()` runs the
//! cross-resource checks and returns the registry as an immutable `Arc`, so
//! `describe` after startup is a lock-free lookup. Descriptors are computed
//! exactly once per type and never change for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use super::descriptor::ResourceDescriptor;
use super::errors::{SchemaError, SchemaResult};
use super::types::{ResourceSchema, TENANT_FIELD};

/// Registry of resource schemas and derived descriptors
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Flattened schemas (inherited fields merged in), by resource name
    schemas: HashMap<String, ResourceSchema>,
    descriptors: HashMap<String, ResourceDescriptor>,
    /// URL path segment -> resource name
    paths: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one schema.
    ///
    /// A schema extending a parent requires the parent to be registered
    /// first; `register_all` takes care of ordering. The descriptor is
    /// derived eagerly so identity-marker faults fail here, at startup.
    pub fn register(&mut self, schema: ResourceSchema) -> SchemaResult<()> {
        if self.schemas.contains_key(&schema.name) {
            return Err(SchemaError::DuplicateResource(schema.name));
        }

        let flattened = self.flatten(schema)?;

        for field in &flattened.fields {
            if field.name == TENANT_FIELD {
                return Err(SchemaError::ReservedField {
                    resource: flattened.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let path = flattened.path().to_string();
        if let Some(existing) = self.paths.get(&path) {
            return Err(SchemaError::DuplicatePath {
                path,
                first: existing.clone(),
                second: flattened.name.clone(),
            });
        }

        let descriptor = ResourceDescriptor::derive(&flattened)?;

        self.paths.insert(path, flattened.name.clone());
        self.descriptors
            .insert(flattened.name.clone(), descriptor);
        self.schemas.insert(flattened.name.clone(), flattened);
        Ok(())
    }

    /// Register a batch of schemas, resolving `extends` ordering.
    ///
    /// Passes over the batch until no progress is made; leftover schemas
    /// name an unknown (or cyclic) parent.
    pub fn register_all(&mut self, schemas: Vec<ResourceSchema>) -> SchemaResult<()> {
        let mut pending = schemas;

        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let before = pending.len();

            for schema in pending {
                let parent_known = schema
                    .extends
                    .as_ref()
                    .map(|p| self.schemas.contains_key(p))
                    .unwrap_or(true);

                if parent_known {
                    self.register(schema)?;
                } else {
                    deferred.push(schema);
                }
            }

            if deferred.len() == before {
                let stuck = deferred.remove(0);
                return Err(SchemaError::UnknownParent {
                    parent: stuck.extends.unwrap_or_default(),
                    resource: stuck.name,
                });
            }
            pending = deferred;
        }

        Ok(())
    }

    /// Run cross-resource checks and freeze the registry.
    ///
    /// Every relation field must target a registered resource; registration
    /// order does not matter since the check runs here.
    pub fn finish(self) -> SchemaResult<Arc<Self>> {
        for descriptor in self.descriptors.values() {
            for (relation, target) in descriptor.relations() {
                if !self.schemas.contains_key(target) {
                    return Err(SchemaError::UnknownRelationTarget {
                        resource: descriptor.resource().to_string(),
                        relation: relation.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(Arc::new(self))
    }

    /// Descriptor for a resource type
    pub fn describe(&self, resource: &str) -> SchemaResult<&ResourceDescriptor> {
        self.descriptors
            .get(resource)
            .ok_or_else(|| SchemaError::UnknownResource(resource.to_string()))
    }

    /// Flattened schema for a resource type
    pub fn schema(&self, resource: &str) -> SchemaResult<&ResourceSchema> {
        self.schemas
            .get(resource)
            .ok_or_else(|| SchemaError::UnknownResource(resource.to_string()))
    }

    /// Resource name owning a URL path segment
    pub fn resource_for_path(&self, path: &str) -> Option<&str> {
        self.paths.get(path).map(String::as_str)
    }

    /// All registered resource names, sorted
    pub fn resources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Merge inherited parent fields ahead of the schema's own fields.
    ///
    /// A child field colliding with a parent field is a fault: a re-declared
    /// identity marker is a multiple-identity fault, anything else a
    /// duplicate field.
    fn flatten(&self, schema: ResourceSchema) -> SchemaResult<ResourceSchema> {
        let Some(parent_name) = schema.extends.clone() else {
            self.check_own_duplicates(&schema)?;
            return Ok(schema);
        };

        let parent = self.schemas.get(&parent_name).ok_or_else(|| {
            SchemaError::UnknownParent {
                resource: schema.name.clone(),
                parent: parent_name.clone(),
            }
        })?;

        let mut fields = parent.fields.clone();
        for own in schema.fields {
            if let Some(inherited) = fields.iter().find(|f| f.name == own.name) {
                if inherited.identity && own.identity {
                    return Err(SchemaError::MultipleIdentity {
                        resource: schema.name.clone(),
                        fields: vec![inherited.name.clone(), own.name.clone()],
                    });
                }
                return Err(SchemaError::DuplicateField {
                    resource: schema.name.clone(),
                    field: own.name,
                });
            }
            fields.push(own);
        }

        Ok(ResourceSchema {
            name: schema.name,
            path: schema.path,
            extends: Some(parent_name),
            fields,
        })
    }

    fn check_own_duplicates(&self, schema: &ResourceSchema) -> SchemaResult<()> {
        for (i, field) in schema.fields.iter().enumerate() {
            if schema.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    resource: schema.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}
