//! # Resource schemas and descriptors
//!
//! Explicit registration-time metadata for every resource type: the schema
//! (fields, types, constraints), the derived descriptor (identity field,
//! relation map), JSON definition loading, and declarative validation.

mod descriptor;
mod errors;
mod loader;
mod registry;
mod types;
mod validator;

pub use descriptor::ResourceDescriptor;
pub use errors::{SchemaError, SchemaResult, StructuredError};
pub use loader::load_schema_dir;
pub use registry::SchemaRegistry;
pub use types::{Constraint, FieldDef, FieldType, ResourceSchema, TENANT_FIELD};
pub use validator::{normalize, ConstraintValidator, Validator, Violation};
