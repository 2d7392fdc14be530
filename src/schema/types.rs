//! Resource schema types
//!
//! A `ResourceSchema` is the explicit, registration-time description of a
//! resource type: its declared fields, which field is the identity, which
//! fields are to-many relations to other resource types, and the declarative
//! constraints checked before every mutation.

use serde::{Deserialize, Serialize};

/// Document field reserved for the tenant partition key.
///
/// Injected by the service on create, invisible to schema validation and not
/// addressable from filter expressions.
pub const TENANT_FIELD: &str = "tenant_id";

/// Field types supported by resource schemas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Identity value, represented as a string
    Id,
    Str,
    Int,
    Float,
    Bool,
    Datetime,
    /// To-many relation: a list of identity values of the target resource
    Relation { target: String },
}

impl FieldType {
    /// Display name used in validation messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Id => "id",
            FieldType::Str => "str",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Datetime => "datetime",
            FieldType::Relation { .. } => "relation",
        }
    }
}

/// Declarative field constraint checked before mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constraint {
    /// Value must not be null when present
    NotNull,
    /// String value must not be empty
    NotEmpty,
}

/// One declared field of a resource schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether this field carries the identity marker
    #[serde(default)]
    pub identity: bool,

    /// Whether this field must be present on create
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            identity: false,
            required: false,
            constraints: Vec::new(),
        }
    }

    /// An identity-marked id field
    pub fn identity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Id,
            identity: true,
            required: false,
            constraints: Vec::new(),
        }
    }

    /// A to-many relation field naming a target resource type
    pub fn relation(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldType::Relation {
                target: target.into(),
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn constrained(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Registration-time description of one resource type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Resource type name, unique across the registry
    pub name: String,

    /// URL path segment; defaults to the resource name
    #[serde(default)]
    pub path: Option<String>,

    /// Parent schema whose fields this schema inherits
    #[serde(default)]
    pub extends: Option<String>,

    pub fields: Vec<FieldDef>,
}

impl ResourceSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            path: None,
            extends: None,
            fields,
        }
    }

    pub fn extending(
        name: impl Into<String>,
        parent: impl Into<String>,
        fields: Vec<FieldDef>,
    ) -> Self {
        Self {
            name: name.into(),
            path: None,
            extends: Some(parent.into()),
            fields,
        }
    }

    /// URL path segment for this resource
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of all declared properties, in declaration order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
