//! Generic resource service
//!
//! One service instance per resource type executes every CRUD and relation
//! operation for it. Each operation runs inside one store transaction; the
//! tenant scope is applied ahead of any caller-supplied predicate and cannot
//! be bypassed. Lifecycle events are published only after a successful
//! commit.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::filter::{self, Criteria, CriteriaFunction, Predicate};
use crate::observability::Logger;
use crate::page::{sort_documents, Page, Pageable};
use crate::schema::{
    normalize, ResourceDescriptor, ResourceSchema, SchemaRegistry, Validator, TENANT_FIELD,
};
use crate::store::{ChangeAction, ChangeEvent, EventPublisher, Store, StoreError, Transaction};

use super::errors::{ConflictCode, ServiceError, ServiceResult};
use super::patch::parse_patch;

/// Tenant-scoped CRUD and relation operations for one resource type
pub struct ResourceService {
    schema: ResourceSchema,
    descriptor: ResourceDescriptor,
    registry: Arc<SchemaRegistry>,
    store: Arc<dyn Store>,
    validator: Option<Arc<dyn Validator>>,
    publisher: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for ResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("resource", &self.descriptor.resource())
            .finish_non_exhaustive()
    }
}

impl ResourceService {
    pub fn new(
        resource: &str,
        registry: Arc<SchemaRegistry>,
        store: Arc<dyn Store>,
        validator: Option<Arc<dyn Validator>>,
        publisher: Arc<dyn EventPublisher>,
    ) -> ServiceResult<Self> {
        let schema = registry.schema(resource)?.clone();
        let descriptor = registry.describe(resource)?.clone();

        Ok(Self {
            schema,
            descriptor,
            registry,
            store,
            validator,
            publisher,
        })
    }

    pub fn resource(&self) -> &str {
        self.descriptor.resource()
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// List entities under the tenant, filtered, sorted, and paginated.
    pub fn list(
        &self,
        tenant: &str,
        predicate: Option<&Predicate>,
        pageable: &Pageable,
    ) -> ServiceResult<Page<Value>> {
        let tx = self.store.begin()?;
        let mut rows = tx.scan(self.resource(), tenant, predicate)?;
        sort_documents(&mut rows, &pageable.sort);
        Ok(pageable.slice(rows))
    }

    /// Fetch one entity by id under the tenant.
    pub fn get(&self, tenant: &str, id: &str) -> ServiceResult<Value> {
        let tx = self.store.begin()?;
        self.fetch_one(tx.as_ref(), tenant, id)
    }

    /// Validate and persist a new entity.
    pub fn create(&self, tenant: &str, payload: Value) -> ServiceResult<Value> {
        let Value::Object(mut obj) = payload else {
            return Err(ServiceError::malformed("payload must be an object"));
        };

        // An explicit tenant field must agree with the request tenant,
        // checked before anything is written.
        if let Some(explicit) = obj.get(TENANT_FIELD) {
            let Some(explicit) = explicit.as_str() else {
                return Err(ServiceError::malformed("tenant id must be a string"));
            };
            if explicit != tenant {
                return Err(ServiceError::TenantMismatch {
                    request: tenant.to_string(),
                    payload: explicit.to_string(),
                });
            }
        }

        let id_field = self.descriptor.identity_field();
        let id = match obj.get(id_field) {
            None | Some(Value::Null) => {
                let generated = Uuid::new_v4().to_string();
                obj.insert(id_field.to_string(), Value::String(generated.clone()));
                generated
            }
            Some(Value::String(id)) => id.clone(),
            Some(_) => {
                return Err(ServiceError::malformed(format!(
                    "identity field '{id_field}' must be a string"
                )))
            }
        };
        obj.insert(TENANT_FIELD.to_string(), Value::String(tenant.to_string()));

        let doc = Value::Object(obj);
        self.validate(&doc)?;

        let mut tx = self.store.begin()?;
        tx.insert(self.resource(), &id, doc.clone())
            .map_err(|e| match e {
                StoreError::DuplicateKey { .. } => ServiceError::conflict(
                    ConflictCode::ResourceAlreadyExists,
                    format!(
                        "resource '{}' with id '{id}' already exists",
                        self.resource()
                    ),
                ),
                other => other.into(),
            })?;
        tx.commit()?;

        self.publish(&id, ChangeAction::Created);
        Ok(doc)
    }

    /// Apply a replace-only patch to an existing entity and re-validate.
    pub fn update(&self, tenant: &str, id: &str, body: &Value) -> ServiceResult<Value> {
        // Parse first: an unsupported operation name fails before any
        // persistence call.
        let ops = parse_patch(body)?;

        let mut tx = self.store.begin()?;
        let mut doc = self.fetch_one(tx.as_ref(), tenant, id)?;
        let Some(obj) = doc.as_object_mut() else {
            return Err(StoreError::fault("stored row is not an object").into());
        };

        let id_field = self.descriptor.identity_field();
        for op in ops {
            if op.field == id_field || op.field == TENANT_FIELD {
                return Err(ServiceError::illegal(format!(
                    "field '{}' is not patchable",
                    op.field
                )));
            }
            obj.insert(op.field, op.value);
        }

        self.validate(&doc)?;
        tx.update(self.resource(), id, doc.clone())?;
        tx.commit()?;

        self.publish(id, ChangeAction::Updated);
        Ok(doc)
    }

    /// Delete an entity under the tenant.
    pub fn delete(&self, tenant: &str, id: &str) -> ServiceResult<()> {
        let mut tx = self.store.begin()?;
        self.fetch_one(tx.as_ref(), tenant, id)?;
        tx.delete(self.resource(), id)?;
        tx.commit()?;

        self.publish(id, ChangeAction::Deleted);
        Ok(())
    }

    /// Page through the entities a relation currently points at.
    pub fn get_related(
        &self,
        tenant: &str,
        id: &str,
        relation: &str,
        pageable: &Pageable,
    ) -> ServiceResult<Page<Value>> {
        let target = self.relation_target(relation)?;
        let tx = self.store.begin()?;
        let owner = self.fetch_one(tx.as_ref(), tenant, id)?;

        let ids = related_ids(&owner, relation);
        if ids.is_empty() {
            return Ok(pageable.slice(Vec::new()));
        }

        let target_schema = self.registry.schema(target)?;
        let target_identity = self.registry.describe(target)?.identity_field();
        let criteria = [Criteria::new(
            target_identity,
            CriteriaFunction::In,
            ids.join(","),
        )];
        let predicate = filter::compile(&criteria, target_schema)?;

        let mut rows = tx.scan(target, tenant, Some(&predicate))?;
        sort_documents(&mut rows, &pageable.sort);
        Ok(pageable.slice(rows))
    }

    /// Attach related entities; all-or-nothing.
    ///
    /// Every id is resolved before anything is staged: unresolvable ids
    /// aggregate into one failure listing all of them, and ids already in
    /// the relation are a conflict rather than a silent no-op.
    pub fn add_related(
        &self,
        tenant: &str,
        id: &str,
        relation: &str,
        related: &[String],
    ) -> ServiceResult<()> {
        let target = self.relation_target(relation)?.to_string();
        if related.is_empty() {
            return Err(ServiceError::illegal("no related ids supplied"));
        }

        let mut tx = self.store.begin()?;
        let mut owner = self.fetch_one(tx.as_ref(), tenant, id)?;

        let mut missing = Vec::new();
        for rid in related {
            if !tx.exists(&target, tenant, rid)? {
                missing.push(rid.clone());
            }
        }
        if !missing.is_empty() {
            return Err(ServiceError::MissingRelated {
                resource: target,
                ids: missing,
            });
        }

        let mut current = related_ids(&owner, relation);
        let already: Vec<String> = related
            .iter()
            .filter(|rid| current.contains(rid))
            .cloned()
            .collect();
        if !already.is_empty() {
            return Err(ServiceError::conflict(
                ConflictCode::RelatedResourceAlreadyExists,
                format!(
                    "resources of type '{target}' are already related: {}",
                    already.join(", ")
                ),
            ));
        }

        for rid in related {
            if !current.contains(rid) {
                current.push(rid.clone());
            }
        }
        set_related_ids(&mut owner, relation, current)?;

        tx.update(self.resource(), id, owner)?;
        tx.commit()?;

        self.publish(id, ChangeAction::Updated);
        Ok(())
    }

    /// Detach related entities; all-or-nothing.
    ///
    /// Ids not currently related are reported, naming the relation's target
    /// type and every missing id.
    pub fn remove_related(
        &self,
        tenant: &str,
        id: &str,
        relation: &str,
        related: &[String],
    ) -> ServiceResult<()> {
        let target = self.relation_target(relation)?.to_string();
        if related.is_empty() {
            return Err(ServiceError::illegal("no related ids supplied"));
        }

        let mut tx = self.store.begin()?;
        let mut owner = self.fetch_one(tx.as_ref(), tenant, id)?;

        let current = related_ids(&owner, relation);
        let missing: Vec<String> = related
            .iter()
            .filter(|rid| !current.contains(rid))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::NotRelated {
                resource: target,
                ids: missing,
            });
        }

        let remaining: Vec<String> = current
            .into_iter()
            .filter(|rid| !related.contains(rid))
            .collect();
        set_related_ids(&mut owner, relation, remaining)?;

        tx.update(self.resource(), id, owner)?;
        tx.commit()?;

        self.publish(id, ChangeAction::Updated);
        Ok(())
    }

    /// Scan by identity under the tenant; zero rows is a not-found, more
    /// than one is an internal consistency fault.
    fn fetch_one(
        &self,
        tx: &dyn Transaction,
        tenant: &str,
        id: &str,
    ) -> ServiceResult<Value> {
        let criteria = [Criteria::new(
            self.descriptor.identity_field(),
            CriteriaFunction::Eq,
            id,
        )];
        let predicate = filter::compile(&criteria, &self.schema)?;

        let mut rows = tx.scan(self.resource(), tenant, Some(&predicate))?;
        if rows.len() > 1 {
            return Err(ServiceError::UnexpectedQueryResult(id.to_string()));
        }
        rows.pop()
            .ok_or_else(|| ServiceError::not_found(self.resource(), id))
    }

    fn relation_target(&self, relation: &str) -> ServiceResult<&str> {
        self.descriptor.relation_target(relation).ok_or_else(|| {
            ServiceError::illegal(format!(
                "unknown relation '{relation}' on resource '{}'",
                self.resource()
            ))
        })
    }

    fn validate(&self, doc: &Value) -> ServiceResult<()> {
        // No validation capability configured: degrade open.
        let Some(validator) = &self.validator else {
            return Ok(());
        };

        let violations = validator.validate(&self.schema, doc);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::ConstraintViolation {
                errors: normalize(violations),
            })
        }
    }

    fn publish(&self, id: &str, action: ChangeAction) {
        Logger::trace(
            "entity_changed",
            &[
                ("action", action.as_str()),
                ("id", id),
                ("resource", self.resource()),
            ],
        );
        self.publisher.publish(ChangeEvent {
            resource: self.resource().to_string(),
            id: id.to_string(),
            action,
        });
    }
}

/// Ids currently held by a relation field
fn related_ids(owner: &Value, relation: &str) -> Vec<String> {
    owner
        .get(relation)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn set_related_ids(owner: &mut Value, relation: &str, ids: Vec<String>) -> ServiceResult<()> {
    let Some(obj) = owner.as_object_mut() else {
        return Err(StoreError::fault("stored row is not an object").into());
    };
    obj.insert(
        relation.to_string(),
        Value::Array(ids.into_iter().map(Value::String).collect()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Constraint, ConstraintValidator, FieldDef, FieldType};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingPublisher {
        events: Mutex<Vec<ChangeEvent>>,
    }

    impl RecordingPublisher {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: ChangeEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn registry() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        registry
            .register(ResourceSchema::new(
                "session",
                vec![
                    FieldDef::identity("id"),
                    FieldDef::new("device", FieldType::Str),
                ],
            ))
            .unwrap();
        registry
            .register(ResourceSchema::new(
                "profile",
                vec![
                    FieldDef::identity("id"),
                    FieldDef::new("bio", FieldType::Str)
                        .required()
                        .constrained(Constraint::NotEmpty),
                    FieldDef::new("dob", FieldType::Datetime).constrained(Constraint::NotNull),
                    FieldDef::relation("sessions", "session"),
                ],
            ))
            .unwrap();
        registry.finish().unwrap()
    }

    fn service_pair(
        registry: &Arc<SchemaRegistry>,
        store: &Arc<MemoryStore>,
        publisher: &Arc<RecordingPublisher>,
    ) -> (ResourceService, ResourceService) {
        let profiles = ResourceService::new(
            "profile",
            registry.clone(),
            store.clone() as Arc<dyn Store>,
            Some(Arc::new(ConstraintValidator::new()) as Arc<dyn Validator>),
            publisher.clone() as Arc<dyn EventPublisher>,
        )
        .unwrap();
        let sessions = ResourceService::new(
            "session",
            registry.clone(),
            store.clone() as Arc<dyn Store>,
            Some(Arc::new(ConstraintValidator::new()) as Arc<dyn Validator>),
            publisher.clone() as Arc<dyn EventPublisher>,
        )
        .unwrap();
        (profiles, sessions)
    }

    #[test]
    fn test_create_generates_identity_and_publishes() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        let created = profiles.create("t1", json!({"bio": "hello"})).unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());
        assert_eq!(created["tenant_id"], "t1");

        let fetched = profiles.get("t1", &id).unwrap();
        assert_eq!(fetched["bio"], "hello");

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, ChangeAction::Created);
        assert_eq!(events[0].id, id);
    }

    #[test]
    fn test_create_validation_failure_persists_nothing() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        let err = profiles
            .create("t1", json!({"id": "p1", "bio": "", "dob": null}))
            .unwrap_err();
        let ServiceError::ConstraintViolation { errors } = err else {
            panic!("expected constraint violation");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "bio");
        assert_eq!(errors[1].field, "dob");

        assert!(matches!(
            profiles.get("t1", "p1").unwrap_err(),
            ServiceError::NotFound { .. }
        ));
        assert!(publisher.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_create_tenant_mismatch_before_write() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        let err = profiles
            .create("t1", json!({"id": "p1", "bio": "x", "tenant_id": "t2"}))
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::TenantMismatch {
                request: "t1".into(),
                payload: "t2".into(),
            }
        );
        assert!(matches!(
            profiles.get("t1", "p1").unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[test]
    fn test_create_duplicate_identity_is_conflict() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        profiles
            .create("t1", json!({"id": "p1", "bio": "x"}))
            .unwrap();
        let err = profiles
            .create("t1", json!({"id": "p1", "bio": "y"}))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conflict {
                code: ConflictCode::ResourceAlreadyExists,
                ..
            }
        ));
    }

    #[test]
    fn test_update_replaces_fields() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        profiles
            .create("t1", json!({"id": "p1", "bio": "old"}))
            .unwrap();
        let patch = json!([{"op": "replace", "path": "/bio", "value": "new"}]);
        let updated = profiles.update("t1", "p1", &patch).unwrap();
        assert_eq!(updated["bio"], "new");

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.last().unwrap().action, ChangeAction::Updated);
    }

    #[test]
    fn test_update_rejects_non_replace_before_touching_store() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        profiles
            .create("t1", json!({"id": "p1", "bio": "old"}))
            .unwrap();
        let patch = json!([{"op": "remove", "path": "/bio", "value": null}]);
        assert_eq!(
            profiles.update("t1", "p1", &patch).unwrap_err(),
            ServiceError::UnsupportedPatchOp("remove".into())
        );

        assert_eq!(profiles.get("t1", "p1").unwrap()["bio"], "old");
    }

    #[test]
    fn test_identity_not_patchable() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        profiles
            .create("t1", json!({"id": "p1", "bio": "x"}))
            .unwrap();
        let patch = json!([{"op": "replace", "path": "/id", "value": "p2"}]);
        assert!(matches!(
            profiles.update("t1", "p1", &patch).unwrap_err(),
            ServiceError::IllegalArgument(_)
        ));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        profiles
            .create("t1", json!({"id": "p1", "bio": "x"}))
            .unwrap();
        profiles.delete("t1", "p1").unwrap();
        assert!(matches!(
            profiles.get("t1", "p1").unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[test]
    fn test_unknown_relation_is_illegal_argument() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, _) = service_pair(&registry, &store, &publisher);

        profiles
            .create("t1", json!({"id": "p1", "bio": "x"}))
            .unwrap();
        let err = profiles
            .get_related("t1", "p1", "friends", &Pageable::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::IllegalArgument(_)));
    }

    #[test]
    fn test_add_related_aggregates_all_missing_ids() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, sessions) = service_pair(&registry, &store, &publisher);

        profiles
            .create("t1", json!({"id": "p1", "bio": "x"}))
            .unwrap();
        sessions
            .create("t1", json!({"id": "s1", "device": "laptop"}))
            .unwrap();

        let ids = vec!["s1".to_string(), "ghost1".to_string(), "ghost2".to_string()];
        let err = profiles
            .add_related("t1", "p1", "sessions", &ids)
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::MissingRelated {
                resource: "session".into(),
                ids: vec!["ghost1".into(), "ghost2".into()],
            }
        );

        // No partial attach.
        let page = profiles
            .get_related("t1", "p1", "sessions", &Pageable::default())
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_add_then_remove_related() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let (profiles, sessions) = service_pair(&registry, &store, &publisher);

        profiles
            .create("t1", json!({"id": "p1", "bio": "x"}))
            .unwrap();
        sessions
            .create("t1", json!({"id": "s1", "device": "laptop"}))
            .unwrap();
        sessions
            .create("t1", json!({"id": "s2", "device": "phone"}))
            .unwrap();

        profiles
            .add_related("t1", "p1", "sessions", &["s1".into(), "s2".into()])
            .unwrap();
        let page = profiles
            .get_related("t1", "p1", "sessions", &Pageable::default())
            .unwrap();
        assert_eq!(page.items.len(), 2);

        // Attaching an already-related id is a conflict, not a no-op.
        let err = profiles
            .add_related("t1", "p1", "sessions", &["s1".into()])
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conflict {
                code: ConflictCode::RelatedResourceAlreadyExists,
                ..
            }
        ));

        profiles
            .remove_related("t1", "p1", "sessions", &["s1".into()])
            .unwrap();
        let page = profiles
            .get_related("t1", "p1", "sessions", &Pageable::default())
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0]["id"], "s2");

        // Detaching an id that is not related names it.
        let err = profiles
            .remove_related("t1", "p1", "sessions", &["s1".into()])
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::NotRelated {
                resource: "session".into(),
                ids: vec!["s1".into()],
            }
        );
    }

    #[test]
    fn test_no_validator_degrades_open() {
        let registry = registry();
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let profiles = ResourceService::new(
            "profile",
            registry,
            store as Arc<dyn Store>,
            None,
            publisher as Arc<dyn EventPublisher>,
        )
        .unwrap();

        // bio is required and not-empty, but with no validator the payload
        // goes through.
        assert!(profiles.create("t1", json!({"bio": ""})).is_ok());
    }
}
