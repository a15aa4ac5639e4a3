//! Game data catalog wiring.
//!
//! This module wraps the JSON datasets under `data/` so callers can load a
//! validated snapshot and query it through one registry. Types here mirror
//! the on-disk layout; callers use `RecordModel` for per-schema queries and
//! `EntityRegistry` for anything that crosses schemas.

pub mod accessor;
pub mod identity;
pub mod index;
pub mod model;
pub mod repository;

pub use accessor::RecordModel;
pub use identity::{EntityId, EntityRef, REFERENCE_SEPARATOR, SchemaId, compose_ref};
pub use index::{EntitySchema, load_validated_catalog, validate_catalog};
pub use model::{
    CATALOG_MANIFEST, Catalog, CatalogManifest, Entity, ManifestEntry, Record, SchemaDescriptor,
    load_catalog_from_dir, read_manifest,
};
pub use repository::{ABILITY_SCHEMA, CLASS_SCHEMAS, CacheStats, EntityRegistry};
