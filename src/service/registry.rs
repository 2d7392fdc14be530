//! Per-type service cache
//!
//! The registration factory: exactly one `ResourceService` instance exists
//! per resource type for the process lifetime. The first caller constructs
//! it; concurrent first access is resolved first-write-wins, discarding the
//! losing instance. Construction failure (an unregistered type) caches
//! nothing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::schema::{SchemaRegistry, Validator};
use crate::store::{EventPublisher, Store, StoreError};

use super::errors::ServiceResult;
use super::service::ResourceService;

/// Memoizing factory for per-resource services
pub struct ServiceRegistry {
    schemas: Arc<SchemaRegistry>,
    store: Arc<dyn Store>,
    validator: Option<Arc<dyn Validator>>,
    publisher: Arc<dyn EventPublisher>,
    services: RwLock<HashMap<String, Arc<ResourceService>>>,
}

impl ServiceRegistry {
    pub fn new(
        schemas: Arc<SchemaRegistry>,
        store: Arc<dyn Store>,
        validator: Option<Arc<dyn Validator>>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            schemas,
            store,
            validator,
            publisher,
            services: RwLock::new(HashMap::new()),
        }
    }

    pub fn schemas(&self) -> &Arc<SchemaRegistry> {
        &self.schemas
    }

    /// The one service instance for a resource type.
    pub fn service_for(&self, resource: &str) -> ServiceResult<Arc<ResourceService>> {
        {
            let services = self
                .services
                .read()
                .map_err(|_| StoreError::fault("lock poisoned"))?;
            if let Some(service) = services.get(resource) {
                return Ok(service.clone());
            }
        }

        // Construct outside the lock; on a race the first insert wins and
        // this instance is discarded.
        let built = Arc::new(ResourceService::new(
            resource,
            self.schemas.clone(),
            self.store.clone(),
            self.validator.clone(),
            self.publisher.clone(),
        )?);

        let mut services = self
            .services
            .write()
            .map_err(|_| StoreError::fault("lock poisoned"))?;
        Ok(services
            .entry(resource.to_string())
            .or_insert(built)
            .clone())
    }
}
