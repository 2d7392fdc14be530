//! HTTP server
//!
//! Axum router over the generated resource surface. Routes are registered
//! once with a generic resource segment; the handler registry resolves the
//! per-type controller from the path on each request. Building the server
//! walks every registered resource and constructs its documented path
//! templates, so parameter-table misconfiguration fails startup rather than
//! a request.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::observability::Logger;
use crate::service::{ServiceError, ServiceRegistry};

use super::errors::{RestError, RestResult};
use super::handler::HandlerRegistry;
use super::params::path_template;
use super::response::ApiResponse;

/// Operation name -> recognized parameter names
const OPERATIONS: &[(&str, &[&str])] = &[
    ("list", &["tenantId", "pageable", "filter"]),
    ("get", &["tenantId", "id"]),
    ("create", &["tenantId", "body"]),
    ("update", &["tenantId", "id", "body"]),
    ("delete", &["tenantId", "id"]),
    ("getRelated", &["tenantId", "id", "relation", "pageable"]),
    ("addRelated", &["tenantId", "id", "relation", "relatedIds"]),
    ("removeRelated", &["tenantId", "id", "relation", "relatedIds"]),
];

/// REST server over every registered resource
pub struct RestServer {
    handlers: Arc<HandlerRegistry>,
}

impl RestServer {
    /// Build the server, verifying the endpoint templates of every resource.
    pub fn new(services: Arc<ServiceRegistry>) -> RestResult<Self> {
        let schemas = services.schemas().clone();
        for resource in schemas.resources() {
            let descriptor = schemas.describe(resource).map_err(ServiceError::from)?;
            for (operation, params) in OPERATIONS {
                let template = path_template(descriptor.path(), params)?;
                Logger::trace(
                    "endpoint_registered",
                    &[
                        ("operation", operation),
                        ("resource", resource),
                        ("template", template.as_str()),
                    ],
                );
            }
            Logger::info("resource_exposed", &[("resource", resource)]);
        }

        Ok(Self {
            handlers: Arc::new(HandlerRegistry::new(services)),
        })
    }

    /// Build the axum router.
    pub fn router(self) -> Router {
        Router::new()
            .route("/resources/{resource}", get(list).post(create))
            .route(
                "/resources/{resource}/{id}",
                get(get_one).patch(update).delete(delete_one),
            )
            .route("/resources/{resource}/{id}/{relation}", get(get_related))
            .route(
                "/resources/{resource}/{id}/{relation}/{related_ids}",
                post(add_related).delete(remove_related),
            )
            .layer(CorsLayer::permissive())
            .with_state(self.handlers)
    }
}

type ServerState = State<Arc<HandlerRegistry>>;

async fn list(
    State(handlers): ServerState,
    Path(resource): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<Value>>, RestError> {
    let handler = handlers.handler_for_path(&resource)?;
    Ok(Json(handler.list(&query)?))
}

async fn create(
    State(handlers): ServerState,
    Path(resource): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), RestError> {
    let handler = handlers.handler_for_path(&resource)?;
    let created = handler.create(&query, body)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_one(
    State(handlers): ServerState,
    Path((resource, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, RestError> {
    let handler = handlers.handler_for_path(&resource)?;
    Ok(Json(handler.get(&query, &id)?))
}

async fn update(
    State(handlers): ServerState,
    Path((resource, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, RestError> {
    let handler = handlers.handler_for_path(&resource)?;
    Ok(Json(handler.update(&query, &id, &body)?))
}

async fn delete_one(
    State(handlers): ServerState,
    Path((resource, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<StatusCode, RestError> {
    let handler = handlers.handler_for_path(&resource)?;
    handler.delete(&query, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_related(
    State(handlers): ServerState,
    Path((resource, id, relation)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<Value>>, RestError> {
    let handler = handlers.handler_for_path(&resource)?;
    Ok(Json(handler.get_related(&query, &id, &relation)?))
}

async fn add_related(
    State(handlers): ServerState,
    Path((resource, id, relation, related_ids)): Path<(String, String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<StatusCode, RestError> {
    let handler = handlers.handler_for_path(&resource)?;
    handler.add_related(&query, &id, &relation, &related_ids)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_related(
    State(handlers): ServerState,
    Path((resource, id, relation, related_ids)): Path<(String, String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<StatusCode, RestError> {
    let handler = handlers.handler_for_path(&resource)?;
    handler.remove_related(&query, &id, &relation, &related_ids)?;
    Ok(StatusCode::NO_CONTENT)
}
