//! Recognized request parameters
//!
//! The static table of inputs every generated endpoint understands. Each
//! parameter declares its source, value kind, whether it is mandatory, and
//! an ordering key so path templates come out identical across all
//! endpoints. Looking up an unknown parameter name is a configuration
//! fault, raised while routes are built at startup.

use super::errors::{RestError, RestResult};

/// Where a parameter is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSource {
    Query,
    Path,
    Body,
}

/// A parameter's value kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Id,
    Str,
    IdList,
    Pageable,
}

/// The closed set of recognized request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestParameter {
    TenantId,
    Id,
    Relation,
    RelatedIds,
    Pageable,
    Filter,
    Body,
}

impl RequestParameter {
    pub const ALL: [RequestParameter; 7] = [
        RequestParameter::TenantId,
        RequestParameter::Id,
        RequestParameter::Relation,
        RequestParameter::RelatedIds,
        RequestParameter::Pageable,
        RequestParameter::Filter,
        RequestParameter::Body,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            RequestParameter::TenantId => "tenantId",
            RequestParameter::Id => "id",
            RequestParameter::Relation => "relation",
            RequestParameter::RelatedIds => "relatedIds",
            RequestParameter::Pageable => "pageable",
            RequestParameter::Filter => "filter",
            RequestParameter::Body => "body",
        }
    }

    pub const fn source(self) -> ParameterSource {
        match self {
            RequestParameter::TenantId
            | RequestParameter::Pageable
            | RequestParameter::Filter => ParameterSource::Query,
            RequestParameter::Id | RequestParameter::Relation | RequestParameter::RelatedIds => {
                ParameterSource::Path
            }
            RequestParameter::Body => ParameterSource::Body,
        }
    }

    pub const fn kind(self) -> ParameterKind {
        match self {
            RequestParameter::TenantId | RequestParameter::Id => ParameterKind::Id,
            RequestParameter::Relation
            | RequestParameter::Filter
            | RequestParameter::Body => ParameterKind::Str,
            RequestParameter::RelatedIds => ParameterKind::IdList,
            RequestParameter::Pageable => ParameterKind::Pageable,
        }
    }

    pub const fn required(self) -> bool {
        !matches!(self, RequestParameter::Filter)
    }

    /// Ordering key for path-template construction
    pub const fn order(self) -> u16 {
        match self {
            RequestParameter::TenantId => 10,
            RequestParameter::Id => 20,
            RequestParameter::Relation => 30,
            RequestParameter::RelatedIds => 40,
            RequestParameter::Pageable => 50,
            RequestParameter::Filter => 60,
            RequestParameter::Body => 200,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Build the path template for an endpoint taking the named parameters.
///
/// Parameters are ordered by their ordering key regardless of input order;
/// only path-sourced parameters contribute segments. An unknown name fails
/// with a configuration error.
pub fn path_template(resource_path: &str, names: &[&str]) -> RestResult<String> {
    let mut params = Vec::with_capacity(names.len());
    for name in names {
        let param = RequestParameter::by_name(name)
            .ok_or_else(|| RestError::Configuration((*name).to_string()))?;
        params.push(param);
    }
    params.sort_by_key(|p| p.order());

    let mut template = format!("/resources/{resource_path}");
    for param in params {
        if param.source() == ParameterSource::Path {
            template.push('/');
            template.push('{');
            template.push_str(param.name());
            template.push('}');
        }
    }
    Ok(template)
}
