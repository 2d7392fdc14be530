//! Query parameter parsing
//!
//! Extracts the tenant id, the pageable, and the optional filter string from
//! a request's query parameters.

use std::collections::HashMap;

use crate::page::{Pageable, SortKey, DEFAULT_SIZE, MAX_SIZE};

use super::errors::{RestError, RestResult};
use super::params::RequestParameter;

/// The mandatory tenant id
pub fn require_tenant(query: &HashMap<String, String>) -> RestResult<String> {
    let name = RequestParameter::TenantId.name();
    match query.get(name) {
        Some(tenant) if !tenant.is_empty() => Ok(tenant.clone()),
        _ => Err(RestError::MissingParam(name.to_string())),
    }
}

/// The optional filter expression
pub fn filter_param(query: &HashMap<String, String>) -> Option<&str> {
    query
        .get(RequestParameter::Filter.name())
        .map(String::as_str)
        .filter(|f| !f.is_empty())
}

/// The pageable: `page`, `size`, and `sort` keys
pub fn parse_pageable(query: &HashMap<String, String>) -> RestResult<Pageable> {
    let page = match query.get("page") {
        Some(raw) => raw
            .parse()
            .map_err(|_| RestError::InvalidQueryParam(format!("invalid page: {raw}")))?,
        None => 0,
    };

    let size = match query.get("size") {
        Some(raw) => {
            let size: usize = raw
                .parse()
                .map_err(|_| RestError::InvalidQueryParam(format!("invalid size: {raw}")))?;
            if size == 0 {
                return Err(RestError::InvalidQueryParam("size must be positive".into()));
            }
            if size > MAX_SIZE {
                return Err(RestError::SizeExceeded(size, MAX_SIZE));
            }
            size
        }
        None => DEFAULT_SIZE,
    };

    let sort = match query.get("sort") {
        Some(raw) => parse_sort(raw)?,
        None => Vec::new(),
    };

    Ok(Pageable { page, size, sort })
}

/// Parse `field.asc,other.desc`; a bare field sorts ascending.
fn parse_sort(raw: &str) -> RestResult<Vec<SortKey>> {
    let mut keys = Vec::new();

    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (field, ascending) = match part.rsplit_once('.') {
            Some((field, "asc")) => (field, true),
            Some((field, "desc")) => (field, false),
            Some((_, direction)) => {
                return Err(RestError::InvalidQueryParam(format!(
                    "invalid sort direction: {direction}"
                )))
            }
            None => (part, true),
        };

        keys.push(SortKey {
            field: field.to_string(),
            ascending,
        });
    }

    Ok(keys)
}
