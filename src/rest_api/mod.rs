//! # Generated REST surface
//!
//! The HTTP contract produced for every registered resource type: CRUD,
//! filtered pagination, and relation attach/detach, all tenant-scoped. The
//! boundary error translator here is the only place failures are mapped to
//! external statuses.

mod errors;
mod handler;
mod params;
mod parser;
mod response;
mod server;

pub use errors::{ErrorBody, RestError, RestResult};
pub use handler::{HandlerRegistry, ResourceHandler};
pub use params::{path_template, ParameterKind, ParameterSource, RequestParameter};
pub use parser::{filter_param, parse_pageable, require_tenant};
pub use response::{next_url, ApiResponse, PageMeta};
pub use server::RestServer;
