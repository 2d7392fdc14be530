//! Shared fixtures: a profile/session schema pair wired to an in-memory
//! store with constraint validation.

use std::sync::Arc;

use resourcery::schema::{
    Constraint, ConstraintValidator, FieldDef, FieldType, ResourceSchema, SchemaRegistry,
    Validator,
};
use resourcery::service::{ResourceService, ServiceRegistry};
use resourcery::store::{MemoryStore, NoopPublisher, Store};

pub fn schema_registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();

    let mut session = ResourceSchema::new(
        "session",
        vec![
            FieldDef::identity("id"),
            FieldDef::new("device", FieldType::Str),
            FieldDef::new("started_at", FieldType::Datetime),
        ],
    );
    session.path = Some("sessions".into());
    registry.register(session).unwrap();

    let mut profile = ResourceSchema::new(
        "profile",
        vec![
            FieldDef::identity("id"),
            FieldDef::new("name", FieldType::Str),
            FieldDef::new("bio", FieldType::Str)
                .required()
                .constrained(Constraint::NotEmpty),
            FieldDef::new("dob", FieldType::Datetime).constrained(Constraint::NotNull),
            FieldDef::new("age", FieldType::Int),
            FieldDef::relation("sessions", "session"),
        ],
    );
    profile.path = Some("profiles".into());
    registry.register(profile).unwrap();

    registry.finish().unwrap()
}

pub fn service_registry() -> Arc<ServiceRegistry> {
    Arc::new(ServiceRegistry::new(
        schema_registry(),
        Arc::new(MemoryStore::new()) as Arc<dyn Store>,
        Some(Arc::new(ConstraintValidator::new()) as Arc<dyn Validator>),
        Arc::new(NoopPublisher),
    ))
}

pub fn profiles(registry: &Arc<ServiceRegistry>) -> Arc<ResourceService> {
    registry.service_for("profile").unwrap()
}

pub fn sessions(registry: &Arc<ServiceRegistry>) -> Arc<ResourceService> {
    registry.service_for("session").unwrap()
}
