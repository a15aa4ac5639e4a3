//! In-memory representation of the game data catalog.
//!
//! A catalog is an ordered list of schema descriptors, each owning the
//! records of one entity collection. Records keep their schema-specific
//! fields as an order-preserving JSON map; the shared search and registry
//! logic only touches the minimal shape exposed by [`Record`].

use crate::catalog::identity::{EntityId, SchemaId};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the catalog manifest inside a data directory.
pub const CATALOG_MANIFEST: &str = "catalog.json";

/// Minimal shape every searchable record satisfies.
///
/// Implementations must be pure accessors: predicates and scoring call these
/// repeatedly and assume the answers never change.
pub trait Record {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str> {
        None
    }
    fn effect(&self) -> Option<&str> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One record of a schema. Everything beyond `id` and `name` lives in `fields`.
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entity {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// A field's value when it is present and a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// A field's value when it is present and numeric.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.field(key).and_then(Value::as_f64)
    }

    /// The roll table attached to this record, if any.
    pub fn table(&self) -> Option<&Value> {
        self.field("table")
    }
}

impl Record for Entity {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    fn effect(&self) -> Option<&str> {
        self.str_field("effect")
    }
}

#[derive(Clone, Debug, Serialize)]
/// An entity collection: stable id, human label, and records in load order.
pub struct SchemaDescriptor {
    pub id: SchemaId,
    pub title: String,
    pub records: Vec<Entity>,
}

impl SchemaDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>, records: Vec<Entity>) -> Self {
        Self {
            id: SchemaId(id.into()),
            title: title.into(),
            records,
        }
    }
}

#[derive(Clone, Debug, Default)]
/// Every schema known to the process, in catalog order.
pub struct Catalog {
    pub schemas: Vec<SchemaDescriptor>,
}

impl Catalog {
    pub fn new(schemas: Vec<SchemaDescriptor>) -> Self {
        Self { schemas }
    }

    pub fn record_count(&self) -> usize {
        self.schemas.iter().map(|schema| schema.records.len()).sum()
    }
}

#[derive(Clone, Debug, Deserialize)]
/// `catalog.json`: which data files make up the catalog, in order.
pub struct CatalogManifest {
    pub schemas: Vec<ManifestEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ManifestEntry {
    pub id: SchemaId,
    pub title: String,
    pub file: PathBuf,
}

impl ManifestEntry {
    /// Data file path, resolved against the manifest directory when relative.
    pub fn resolve(&self, data_dir: &Path) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            data_dir.join(&self.file)
        }
    }
}

pub fn read_manifest(data_dir: &Path) -> Result<CatalogManifest> {
    let path = data_dir.join(CATALOG_MANIFEST);
    if !path.is_file() {
        bail!("catalog manifest not found: {}", path.display());
    }
    let data = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

/// Read one data file as raw JSON.
pub(crate) fn read_records_value(path: &Path) -> Result<Value> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

/// Read and parse a catalog directory without additional validation.
pub fn load_catalog_from_dir(data_dir: &Path) -> Result<Catalog> {
    let manifest = read_manifest(data_dir)?;
    let mut schemas = Vec::with_capacity(manifest.schemas.len());
    for entry in manifest.schemas {
        let path = entry.resolve(data_dir);
        let records: Vec<Entity> = serde_json::from_value(read_records_value(&path)?)
            .with_context(|| format!("decoding records in {}", path.display()))?;
        schemas.push(SchemaDescriptor {
            id: entry.id,
            title: entry.title,
            records,
        });
    }
    Ok(Catalog { schemas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn entity_keeps_extra_fields_in_author_order() {
        let entity = Entity::from_value(json!({
            "id": "a1",
            "name": "Energy Shield",
            "techLevel": 3,
            "description": "projects a shield",
            "effect": 12
        }))
        .unwrap();
        let keys: Vec<&str> = entity.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["techLevel", "description", "effect"]);
        assert_eq!(entity.description(), Some("projects a shield"));
        // non-string effect is treated as absent
        assert_eq!(entity.effect(), None);
        assert_eq!(entity.number("techLevel"), Some(3.0));
    }

    #[test]
    fn entity_requires_id_and_name() {
        assert!(Entity::from_value(json!({"id": "x"})).is_err());
        assert!(Entity::from_value(json!({"name": "x"})).is_err());
    }

    #[test]
    fn load_catalog_preserves_manifest_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CATALOG_MANIFEST),
            json!({"schemas": [
                {"id": "systems", "title": "Systems", "file": "systems.json"},
                {"id": "modules", "title": "Modules", "file": "nested/modules.json"}
            ]})
            .to_string(),
        )
        .unwrap();
        fs::write(
            dir.path().join("systems.json"),
            json!([{"id": "s1", "name": "Railgun"}]).to_string(),
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/modules.json"),
            json!([{"id": "m1", "name": "Scanner"}, {"id": "m2", "name": "Winch"}]).to_string(),
        )
        .unwrap();

        let catalog = load_catalog_from_dir(dir.path()).unwrap();
        let ids: Vec<&str> = catalog.schemas.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["systems", "modules"]);
        assert_eq!(catalog.record_count(), 3);
    }

    #[test]
    fn missing_manifest_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = load_catalog_from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("catalog manifest not found"));
    }
}
