//! Schema definition loading
//!
//! Resource schemas are declared in JSON files, one schema per `.json` file
//! in a definition directory. Files are read in name order so diagnostics
//! and registration are deterministic.

use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::ResourceSchema;

/// Load every `*.json` schema definition under `dir`.
pub fn load_schema_dir(dir: &Path) -> SchemaResult<Vec<ResourceSchema>> {
    let entries = fs::read_dir(dir).map_err(|e| SchemaError::InvalidDefinition {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut files: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    files.sort();

    let mut schemas = Vec::with_capacity(files.len());
    for file in files {
        let raw = fs::read_to_string(&file).map_err(|e| SchemaError::InvalidDefinition {
            path: file.display().to_string(),
            reason: e.to_string(),
        })?;
        let schema: ResourceSchema =
            serde_json::from_str(&raw).map_err(|e| SchemaError::InvalidDefinition {
                path: file.display().to_string(),
                reason: e.to_string(),
            })?;
        schemas.push(schema);
    }

    Ok(schemas)
}
