//! CLI commands

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use crate::observability::Logger;
use crate::rest_api::RestServer;
use crate::schema::{load_schema_dir, ConstraintValidator, SchemaRegistry, Validator};
use crate::service::ServiceRegistry;
use crate::store::{MemoryStore, NoopPublisher};

use super::args::{Cli, Command};
use super::errors::CliResult;

/// Parse arguments and dispatch.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve { schema_dir, port } => serve(&schema_dir, port),
        Command::Check { schema_dir } => check(&schema_dir),
    }
}

/// Load, register, and seal the schema directory.
fn build_registry(schema_dir: &Path) -> CliResult<Arc<SchemaRegistry>> {
    let schemas = load_schema_dir(schema_dir)?;
    let mut registry = SchemaRegistry::new();
    registry.register_all(schemas)?;
    Ok(registry.finish()?)
}

fn serve(schema_dir: &Path, port: u16) -> CliResult<()> {
    let schemas = build_registry(schema_dir)?;
    Logger::info(
        "schemas_loaded",
        &[("count", schemas.resources().len().to_string().as_str())],
    );

    let services = Arc::new(ServiceRegistry::new(
        schemas,
        Arc::new(MemoryStore::new()),
        Some(Arc::new(ConstraintValidator::new()) as Arc<dyn Validator>),
        Arc::new(NoopPublisher),
    ));
    let router = RestServer::new(services)?.router();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        Logger::info("serving", &[("port", port.to_string().as_str())]);
        axum::serve(listener, router).await
    })?;

    Ok(())
}

fn check(schema_dir: &Path) -> CliResult<()> {
    let schemas = build_registry(schema_dir)?;
    for resource in schemas.resources() {
        let descriptor = schemas.describe(resource)?;
        println!(
            "{resource}: identity '{}', {} relation(s)",
            descriptor.identity_field(),
            descriptor.relations().len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_build_registry_from_directory() {
        let dir = TempDir::new().unwrap();
        let mut f = File::create(dir.path().join("profile.json")).unwrap();
        f.write_all(
            br#"{"name": "profile", "fields": [{"name": "id", "type": "id", "identity": true}]}"#,
        )
        .unwrap();

        let registry = build_registry(dir.path()).unwrap();
        assert_eq!(registry.resources(), vec!["profile"]);
    }

    #[test]
    fn test_build_registry_fails_on_bad_schema() {
        let dir = TempDir::new().unwrap();
        let mut f = File::create(dir.path().join("bad.json")).unwrap();
        // No identity field: a configuration fault at startup.
        f.write_all(br#"{"name": "bad", "fields": [{"name": "x", "type": "str"}]}"#)
            .unwrap();

        assert!(build_registry(dir.path()).is_err());
    }
}
