//! Validated catalog loading.
//!
//! Every data file is checked against `schema/entity.schema.json` before it
//! is decoded, then the catalog-level invariants are enforced: schema ids and
//! titles are non-empty, schema ids are unique, and entity ids are unique
//! within their schema. Problems are collected so one run reports all of them.

use crate::catalog::identity::SchemaId;
use crate::catalog::model::{
    Catalog, CatalogManifest, Entity, SchemaDescriptor, read_manifest, read_records_value,
};
use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

const ENTITY_SCHEMA: &str = include_str!("../../schema/entity.schema.json");

/// Compiled form of the shipped entity collection schema.
pub struct EntitySchema {
    compiled: JSONSchema,
}

impl EntitySchema {
    pub fn compile() -> Result<Self> {
        let raw: Value =
            serde_json::from_str(ENTITY_SCHEMA).context("parsing bundled entity schema")?;
        let compiled = JSONSchema::compile(&raw)
            .map_err(|err| anyhow!("compiling bundled entity schema: {err}"))?;
        Ok(Self { compiled })
    }

    /// Validate one data file's JSON, reporting every violation.
    pub fn check(&self, records: &Value, origin: &Path) -> Result<()> {
        if let Err(errors) = self.compiled.validate(records) {
            let details = errors
                .map(|err| format!("{}: {err}", err.instance_path))
                .collect::<Vec<_>>()
                .join("\n");
            bail!(
                "records in {} failed schema validation:\n{}",
                origin.display(),
                details
            );
        }
        Ok(())
    }
}

/// Load a catalog directory, validating files and catalog invariants.
pub fn load_validated_catalog(data_dir: &Path) -> Result<Catalog> {
    let manifest = read_manifest(data_dir)?;
    validate_manifest(&manifest)?;
    let schema = EntitySchema::compile()?;

    let mut schemas = Vec::with_capacity(manifest.schemas.len());
    for entry in manifest.schemas {
        let path = entry.resolve(data_dir);
        let value = read_records_value(&path)?;
        schema.check(&value, &path)?;
        let records: Vec<Entity> = serde_json::from_value(value)
            .with_context(|| format!("decoding records in {}", path.display()))?;
        schemas.push(SchemaDescriptor {
            id: entry.id,
            title: entry.title,
            records,
        });
    }

    let catalog = Catalog::new(schemas);
    validate_catalog(&catalog)?;
    info!(
        dir = %data_dir.display(),
        schemas = catalog.schemas.len(),
        records = catalog.record_count(),
        "loaded catalog"
    );
    Ok(catalog)
}

fn validate_manifest(manifest: &CatalogManifest) -> Result<()> {
    if manifest.schemas.is_empty() {
        bail!("catalog manifest lists no schemas");
    }
    let mut seen = BTreeSet::new();
    for entry in &manifest.schemas {
        validate_schema_header(&entry.id, &entry.title)?;
        if !seen.insert(&entry.id) {
            bail!("duplicate schema id {}", entry.id);
        }
    }
    Ok(())
}

fn validate_schema_header(id: &SchemaId, title: &str) -> Result<()> {
    if id.0.trim().is_empty() {
        bail!("schema id must not be empty");
    }
    if title.trim().is_empty() {
        bail!("schema {id} must have a title");
    }
    Ok(())
}

/// Check the invariants the registry and search rely on.
pub fn validate_catalog(catalog: &Catalog) -> Result<()> {
    let mut problems = Vec::new();
    let mut schema_ids = BTreeSet::new();
    for schema in &catalog.schemas {
        if let Err(err) = validate_schema_header(&schema.id, &schema.title) {
            problems.push(err.to_string());
        }
        if !schema_ids.insert(&schema.id) {
            problems.push(format!("duplicate schema id {}", schema.id));
        }
        let mut entity_ids = BTreeSet::new();
        for entity in &schema.records {
            if entity.id.0.is_empty() {
                problems.push(format!("{} contains an entity with no id", schema.id));
                continue;
            }
            if entity.name.is_empty() {
                problems.push(format!("{}::{} has an empty name", schema.id, entity.id));
            }
            if !entity_ids.insert(&entity.id) {
                problems.push(format!("duplicate entity id {}::{}", schema.id, entity.id));
            }
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        bail!("catalog failed validation:\n{}", problems.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::CATALOG_MANIFEST;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_catalog(dir: &Path, files: &[(&str, Value)]) {
        let schemas: Vec<Value> = files
            .iter()
            .map(|(id, _)| json!({"id": id, "title": id.to_uppercase(), "file": format!("{id}.json")}))
            .collect();
        fs::write(
            dir.join(CATALOG_MANIFEST),
            json!({ "schemas": schemas }).to_string(),
        )
        .unwrap();
        for (id, records) in files {
            fs::write(dir.join(format!("{id}.json")), records.to_string()).unwrap();
        }
    }

    #[test]
    fn valid_catalog_loads() {
        let dir = TempDir::new().unwrap();
        write_catalog(
            dir.path(),
            &[
                ("systems", json!([{"id": "s1", "name": "Railgun", "techLevel": 3}])),
                ("modules", json!([{"id": "m1", "name": "Scanner"}])),
            ],
        );
        let catalog = load_validated_catalog(dir.path()).unwrap();
        assert_eq!(catalog.schemas.len(), 2);
        assert_eq!(catalog.schemas[0].title, "SYSTEMS");
    }

    #[test]
    fn schema_violations_are_collected() {
        let dir = TempDir::new().unwrap();
        write_catalog(
            dir.path(),
            &[(
                "systems",
                json!([{"id": "", "name": "Railgun"}, {"id": "s2"}, {"id": "s3", "name": 7}]),
            )],
        );
        let err = load_validated_catalog(dir.path()).unwrap_err().to_string();
        assert!(err.contains("failed schema validation"), "{err}");
        assert!(err.contains("/0/id"), "{err}");
        assert!(err.contains("/2/name"), "{err}");
    }

    #[test]
    fn optional_fields_of_any_type_load() {
        let dir = TempDir::new().unwrap();
        write_catalog(
            dir.path(),
            &[(
                "systems",
                json!([{"id": "s1", "name": "Plate", "description": 7, "effect": ["shield"], "techLevel": "high"}]),
            )],
        );
        let catalog = load_validated_catalog(dir.path()).unwrap();
        assert_eq!(catalog.schemas[0].records[0].field("description"), Some(&json!(7)));
    }

    #[test]
    fn duplicate_entity_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_catalog(
            dir.path(),
            &[(
                "systems",
                json!([{"id": "s1", "name": "Railgun"}, {"id": "s1", "name": "Winch"}]),
            )],
        );
        let err = load_validated_catalog(dir.path()).unwrap_err().to_string();
        assert!(err.contains("duplicate entity id systems::s1"), "{err}");
    }

    #[test]
    fn duplicate_schema_ids_are_rejected_in_manifest() {
        let dir = TempDir::new().unwrap();
        write_catalog(
            dir.path(),
            &[
                ("systems", json!([])),
                ("systems", json!([])),
            ],
        );
        let err = load_validated_catalog(dir.path()).unwrap_err().to_string();
        assert!(err.contains("duplicate schema id systems"), "{err}");
    }

    #[test]
    fn in_memory_catalog_checks_names() {
        let catalog = Catalog::new(vec![SchemaDescriptor::new(
            "systems",
            "Systems",
            vec![Entity::from_value(json!({"id": "s1", "name": ""})).unwrap()],
        )]);
        let err = validate_catalog(&catalog).unwrap_err().to_string();
        assert!(err.contains("systems::s1 has an empty name"), "{err}");
    }
}
