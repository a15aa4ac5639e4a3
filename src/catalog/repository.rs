//! Cross-schema entry point over a loaded catalog.
//!
//! The registry owns the catalog, maps each schema id to its records, and
//! resolves `schema::id` references. Lookups by id go through an unbounded
//! position cache: the data never changes after load, so entries are never
//! invalidated. Only hits are cached; a repeated miss rescans.

use crate::catalog::accessor::RecordModel;
use crate::catalog::identity::{EntityRef, SchemaId, compose_ref, split_ref};
use crate::catalog::model::{Catalog, Entity, SchemaDescriptor};
use crate::error::{RegistryError, RegistryResult};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Class schemas, in the order `all_classes` unions them.
pub const CLASS_SCHEMAS: [&str; 3] = ["classes.core", "classes.advanced", "classes.hybrid"];
/// Schema holding the abilities classes draw from.
pub const ABILITY_SCHEMA: &str = "abilities";
// Class fields naming the ability trees a class can learn from.
const CLASS_TREE_LIST_FIELDS: &[&str] = &["coreTrees"];
const CLASS_TREE_FIELDS: &[&str] = &["advancedTree", "hybridTree", "legendaryTree"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Counters describing how `get` has been served so far.
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
    /// Collection scans performed on behalf of `get`.
    pub scans: usize,
}

#[derive(Debug)]
pub struct EntityRegistry {
    catalog: Catalog,
    by_schema: BTreeMap<SchemaId, usize>,
    // (schema position, entity id) -> record position inside that schema
    cache: RwLock<HashMap<(usize, String), usize>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    scans: AtomicUsize,
}

impl EntityRegistry {
    /// Build the registry, one accessor slot per descriptor.
    ///
    /// Fails when two descriptors share an id, since lookups by schema would
    /// otherwise silently shadow one of them.
    pub fn new(catalog: Catalog) -> RegistryResult<Self> {
        let mut by_schema = BTreeMap::new();
        for (position, schema) in catalog.schemas.iter().enumerate() {
            if by_schema.insert(schema.id.clone(), position).is_some() {
                return Err(RegistryError::DuplicateSchema(schema.id.0.clone()));
            }
        }
        info!(
            schemas = catalog.schemas.len(),
            records = catalog.record_count(),
            "entity registry ready"
        );
        Ok(Self {
            catalog,
            by_schema,
            cache: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            scans: AtomicUsize::new(0),
        })
    }

    /// Registered schemas in catalog order.
    pub fn schemas(&self) -> impl Iterator<Item = &SchemaDescriptor> {
        self.catalog.schemas.iter()
    }

    pub fn schema(&self, schema_id: &str) -> Option<&SchemaDescriptor> {
        self.by_schema
            .get(schema_id)
            .map(|&position| &self.catalog.schemas[position])
    }

    pub fn has_schema(&self, schema_id: &str) -> bool {
        self.by_schema.contains_key(schema_id)
    }

    /// Accessor for one schema.
    pub fn model(&self, schema_id: &str) -> RegistryResult<RecordModel<'_>> {
        self.schema(schema_id)
            .map(|schema| RecordModel::new(&schema.records))
            .ok_or_else(|| RegistryError::UnknownSchema(schema_id.to_string()))
    }

    pub fn find_in<P>(&self, schema_id: &str, predicate: P) -> RegistryResult<Option<&Entity>>
    where
        P: Fn(&Entity) -> bool,
    {
        Ok(self.model(schema_id)?.find(predicate))
    }

    pub fn find_all_in<P>(&self, schema_id: &str, predicate: P) -> RegistryResult<Vec<&Entity>>
    where
        P: Fn(&Entity) -> bool,
    {
        Ok(self.model(schema_id)?.find_all(predicate))
    }

    /// Look up an entity by id, served from the cache after the first hit.
    ///
    /// An unregistered schema is just a miss here; use [`Self::find_in`] to
    /// distinguish it.
    pub fn get(&self, schema_id: &str, id: &str) -> Option<&Entity> {
        let slot = *self.by_schema.get(schema_id)?;
        let schema = &self.catalog.schemas[slot];
        let key = (slot, id.to_string());

        let cached = self
            .cache
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .get(&key)
            .copied();
        if let Some(position) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return schema.records.get(position);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        self.scans.fetch_add(1, Ordering::Relaxed);
        let Some(position) = RecordModel::new(&schema.records).position(|e| e.id.as_str() == id)
        else {
            debug!(schema = schema_id, id, "entity not found");
            return None;
        };

        debug!(schema = schema_id, id, position, "caching entity position");
        self.cache
            .write()
            .unwrap_or_else(|err| err.into_inner())
            .insert(key, position);
        schema.records.get(position)
    }

    pub fn exists(&self, schema_id: &str, id: &str) -> bool {
        self.get(schema_id, id).is_some()
    }

    /// Order-preserving batch `get`; a miss yields `None` at its position.
    pub fn get_many(&self, requests: &[EntityRef]) -> Vec<Option<&Entity>> {
        requests
            .iter()
            .map(|request| self.get(request.schema.as_str(), request.id.as_str()))
            .collect()
    }

    pub fn compose_ref(&self, schema_id: &str, id: &str) -> String {
        compose_ref(schema_id, id)
    }

    /// Parse `schema::id`, requiring two non-empty halves and a registered schema.
    pub fn parse_ref(&self, reference: &str) -> RegistryResult<EntityRef> {
        let invalid = |reason: &str| RegistryError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };
        let (schema, id) =
            split_ref(reference).ok_or_else(|| invalid("expected exactly '<schema>::<id>'"))?;
        if !self.has_schema(schema) {
            return Err(invalid(&format!("unknown schema '{schema}'")));
        }
        Ok(EntityRef::new(schema, id))
    }

    /// Resolve a reference string. A malformed reference is reported as a miss.
    pub fn get_by_ref(&self, reference: &str) -> Option<&Entity> {
        let parsed = self.parse_ref(reference).ok()?;
        self.get(parsed.schema.as_str(), parsed.id.as_str())
    }

    /// Resolve each reference, keyed by the original string; duplicates collapse.
    pub fn get_many_by_ref<S: AsRef<str>>(&self, refs: &[S]) -> BTreeMap<String, Option<&Entity>> {
        refs.iter()
            .map(|reference| {
                let reference = reference.as_ref();
                (reference.to_string(), self.get_by_ref(reference))
            })
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self
                .cache
                .read()
                .unwrap_or_else(|err| err.into_inner())
                .len(),
            scans: self.scans.load(Ordering::Relaxed),
        }
    }

    /// Every class across the core, advanced, and hybrid schemas.
    pub fn all_classes(&self) -> Vec<&Entity> {
        CLASS_SCHEMAS
            .iter()
            .filter_map(|schema_id| self.schema(schema_id))
            .flat_map(|schema| schema.records.iter())
            .collect()
    }

    pub fn find_class_by_id(&self, id: &str) -> Option<&Entity> {
        CLASS_SCHEMAS
            .iter()
            .find_map(|schema_id| self.get(schema_id, id))
    }

    /// Abilities in any tree the class can learn from, in ability order.
    pub fn abilities_for_class(&self, class_id: &str) -> Vec<&Entity> {
        let Some(class) = self.find_class_by_id(class_id) else {
            return Vec::new();
        };
        let trees = class_trees(class);
        if trees.is_empty() {
            return Vec::new();
        }
        self.find_all_in(ABILITY_SCHEMA, |ability| {
            ability
                .str_field("tree")
                .is_some_and(|tree| trees.contains(tree))
        })
        .unwrap_or_default()
    }
}

fn class_trees(class: &Entity) -> BTreeSet<&str> {
    let mut trees = BTreeSet::new();
    for field in CLASS_TREE_LIST_FIELDS {
        if let Some(list) = class.field(field).and_then(Value::as_array) {
            trees.extend(list.iter().filter_map(Value::as_str));
        }
    }
    for field in CLASS_TREE_FIELDS {
        if let Some(tree) = class.str_field(field) {
            trees.insert(tree);
        }
    }
    trees
}
