//! Per-resource request handlers
//!
//! A `ResourceHandler` is the controller half of the per-type pair: it
//! parses request inputs, compiles the filter when one is supplied, and
//! delegates to its service. The `HandlerRegistry` memoizes exactly one
//! handler per resource type, first-write-wins under concurrent first
//! access, mirroring the service cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::filter;
use crate::schema::SchemaError;
use crate::service::{ResourceService, ServiceError, ServiceRegistry};
use crate::store::StoreError;

use super::errors::RestResult;
use super::parser;
use super::response::{next_url, ApiResponse};

/// Controller for one resource type
pub struct ResourceHandler {
    service: Arc<ResourceService>,
}

impl std::fmt::Debug for ResourceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandler")
            .field("service", &self.service)
            .finish()
    }
}

impl ResourceHandler {
    pub fn new(service: Arc<ResourceService>) -> Self {
        Self { service }
    }

    fn base_path(&self) -> String {
        format!("/resources/{}", self.service.descriptor().path())
    }

    pub fn list(&self, query: &HashMap<String, String>) -> RestResult<ApiResponse<Value>> {
        let tenant = parser::require_tenant(query)?;
        let pageable = parser::parse_pageable(query)?;
        let filter_text = parser::filter_param(query);

        let predicate = match filter_text {
            Some(expression) => {
                let criteria = filter::parse(expression).map_err(ServiceError::from)?;
                Some(
                    filter::compile(&criteria, self.service.schema())
                        .map_err(ServiceError::from)?,
                )
            }
            None => None,
        };

        let page = self.service.list(&tenant, predicate.as_ref(), &pageable)?;
        let next = page
            .has_next()
            .then(|| next_url(&self.base_path(), &tenant, &pageable, filter_text));
        Ok(ApiResponse::from_page(page, next))
    }

    pub fn get(&self, query: &HashMap<String, String>, id: &str) -> RestResult<Value> {
        let tenant = parser::require_tenant(query)?;
        Ok(self.service.get(&tenant, id)?)
    }

    pub fn create(&self, query: &HashMap<String, String>, body: Value) -> RestResult<Value> {
        let tenant = parser::require_tenant(query)?;
        Ok(self.service.create(&tenant, body)?)
    }

    pub fn update(
        &self,
        query: &HashMap<String, String>,
        id: &str,
        body: &Value,
    ) -> RestResult<Value> {
        let tenant = parser::require_tenant(query)?;
        Ok(self.service.update(&tenant, id, body)?)
    }

    pub fn delete(&self, query: &HashMap<String, String>, id: &str) -> RestResult<()> {
        let tenant = parser::require_tenant(query)?;
        Ok(self.service.delete(&tenant, id)?)
    }

    pub fn get_related(
        &self,
        query: &HashMap<String, String>,
        id: &str,
        relation: &str,
    ) -> RestResult<ApiResponse<Value>> {
        let tenant = parser::require_tenant(query)?;
        let pageable = parser::parse_pageable(query)?;

        let page = self.service.get_related(&tenant, id, relation, &pageable)?;
        let next = page.has_next().then(|| {
            let base = format!("{}/{id}/{relation}", self.base_path());
            next_url(&base, &tenant, &pageable, None)
        });
        Ok(ApiResponse::from_page(page, next))
    }

    pub fn add_related(
        &self,
        query: &HashMap<String, String>,
        id: &str,
        relation: &str,
        related_ids: &str,
    ) -> RestResult<()> {
        let tenant = parser::require_tenant(query)?;
        let ids = split_ids(related_ids);
        Ok(self.service.add_related(&tenant, id, relation, &ids)?)
    }

    pub fn remove_related(
        &self,
        query: &HashMap<String, String>,
        id: &str,
        relation: &str,
        related_ids: &str,
    ) -> RestResult<()> {
        let tenant = parser::require_tenant(query)?;
        let ids = split_ids(related_ids);
        Ok(self.service.remove_related(&tenant, id, relation, &ids)?)
    }
}

/// Comma-delimited path segment of related ids
fn split_ids(segment: &str) -> Vec<String> {
    segment
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Memoizing per-type handler cache
pub struct HandlerRegistry {
    services: Arc<ServiceRegistry>,
    handlers: RwLock<HashMap<String, Arc<ResourceHandler>>>,
}

impl HandlerRegistry {
    pub fn new(services: Arc<ServiceRegistry>) -> Self {
        Self {
            services,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// Resolve the handler owning a URL path segment.
    pub fn handler_for_path(&self, path: &str) -> RestResult<Arc<ResourceHandler>> {
        let resource = self
            .services
            .schemas()
            .resource_for_path(path)
            .ok_or_else(|| {
                ServiceError::Schema(SchemaError::UnknownResource(path.to_string()))
            })?
            .to_string();
        self.handler_for(&resource)
    }

    /// The one handler instance for a resource type.
    pub fn handler_for(&self, resource: &str) -> RestResult<Arc<ResourceHandler>> {
        {
            let handlers = self
                .handlers
                .read()
                .map_err(|_| ServiceError::from(StoreError::fault("lock poisoned")))?;
            if let Some(handler) = handlers.get(resource) {
                return Ok(handler.clone());
            }
        }

        let built = Arc::new(ResourceHandler::new(self.services.service_for(resource)?));

        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ServiceError::from(StoreError::fault("lock poisoned")))?;
        Ok(handlers
            .entry(resource.to_string())
            .or_insert(built)
            .clone())
    }
}
